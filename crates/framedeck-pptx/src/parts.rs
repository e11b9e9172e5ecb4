//! XML bodies of the package parts.

use std::fmt::Write as _;

use crate::geometry::{Rect, SlideSize};
use crate::presentation::ImageFormat;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXT_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
const REL_VIEW_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
const REL_TABLE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Relationship ids in presentation.xml.rels before the first slide.
const PRESENTATION_FIXED_RELS: usize = 5;

/// Slide ids start at 256 per ECMA-376.
const FIRST_SLIDE_ID: usize = 256;

pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";
pub(crate) const ROOT_RELS: &str = "_rels/.rels";
pub(crate) const CORE_PROPS: &str = "docProps/core.xml";
pub(crate) const APP_PROPS: &str = "docProps/app.xml";
pub(crate) const PRESENTATION: &str = "ppt/presentation.xml";
pub(crate) const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
pub(crate) const PRES_PROPS: &str = "ppt/presProps.xml";
pub(crate) const VIEW_PROPS: &str = "ppt/viewProps.xml";
pub(crate) const TABLE_STYLES: &str = "ppt/tableStyles.xml";
pub(crate) const SLIDE_MASTER: &str = "ppt/slideMasters/slideMaster1.xml";
pub(crate) const SLIDE_MASTER_RELS: &str = "ppt/slideMasters/_rels/slideMaster1.xml.rels";
pub(crate) const SLIDE_LAYOUT: &str = "ppt/slideLayouts/slideLayout1.xml";
pub(crate) const SLIDE_LAYOUT_RELS: &str = "ppt/slideLayouts/_rels/slideLayout1.xml.rels";
pub(crate) const THEME: &str = "ppt/theme/theme1.xml";

/// Part name of the n-th slide (1-based, as in the package).
pub(crate) fn slide_part(n: usize) -> String {
    format!("ppt/slides/slide{n}.xml")
}

pub(crate) fn slide_rels_part(n: usize) -> String {
    format!("ppt/slides/_rels/slide{n}.xml.rels")
}

pub(crate) fn media_part(n: usize, format: ImageFormat) -> String {
    format!("ppt/media/image{n}.{}", format.extension())
}

/// Escape text for use in XML content and attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

struct Relationships {
    body: String,
}

impl Relationships {
    fn new() -> Self {
        Self {
            body: format!(r#"{XML_DECL}<Relationships xmlns="{NS_PKG_RELS}">"#),
        }
    }

    fn add(mut self, id: usize, kind: &str, target: &str) -> Self {
        let _ = write!(
            self.body,
            r#"<Relationship Id="rId{id}" Type="{kind}" Target="{target}"/>"#
        );
        self
    }

    fn finish(mut self) -> String {
        self.body.push_str("</Relationships>");
        self.body
    }
}

pub(crate) fn content_types(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for format in [ImageFormat::Jpeg, ImageFormat::Png] {
        let _ = write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.content_type()
        );
    }
    let overrides = [
        (PRESENTATION, CT_PRESENTATION),
        (SLIDE_MASTER, "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"),
        (SLIDE_LAYOUT, "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"),
        (THEME, "application/vnd.openxmlformats-officedocument.theme+xml"),
        (PRES_PROPS, "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"),
        (VIEW_PROPS, "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml"),
        (TABLE_STYLES, "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml"),
        (CORE_PROPS, "application/vnd.openxmlformats-package.core-properties+xml"),
        (APP_PROPS, "application/vnd.openxmlformats-officedocument.extended-properties+xml"),
    ];
    for (part, content_type) in overrides {
        let _ = write!(xml, r#"<Override PartName="/{part}" ContentType="{content_type}"/>"#);
    }
    for n in 1..=slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/{}" ContentType="{CT_SLIDE}"/>"#,
            slide_part(n)
        );
    }
    xml.push_str("</Types>");
    xml
}

pub(crate) fn root_rels() -> String {
    Relationships::new()
        .add(1, REL_OFFICE_DOCUMENT, PRESENTATION)
        .add(2, REL_CORE_PROPS, CORE_PROPS)
        .add(3, REL_EXT_PROPS, APP_PROPS)
        .finish()
}

pub(crate) fn core_props(title: Option<&str>) -> String {
    let mut xml = format!(
        concat!(
            r#"{}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
        ),
        XML_DECL
    );
    if let Some(title) = title {
        let _ = write!(xml, "<dc:title>{}</dc:title>", escape(title));
    }
    xml.push_str("<dc:creator>framedeck</dc:creator></cp:coreProperties>");
    xml
}

pub(crate) fn app_props(slide_count: usize) -> String {
    format!(
        concat!(
            r#"{}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
            r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>framedeck</Application><Slides>{}</Slides></Properties>"
        ),
        XML_DECL, slide_count
    )
}

pub(crate) fn presentation(size: SlideSize, slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
    );
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if slide_count > 0 {
        xml.push_str("<p:sldIdLst>");
        for i in 0..slide_count {
            let _ = write!(
                xml,
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                FIRST_SLIDE_ID + i,
                PRESENTATION_FIXED_RELS + 1 + i
            );
        }
        xml.push_str("</p:sldIdLst>");
    }
    let _ = write!(xml, r#"<p:sldSz cx="{}" cy="{}""#, size.cx, size.cy);
    if let Some(kind) = size.type_attr() {
        let _ = write!(xml, r#" type="{kind}""#);
    }
    xml.push_str(r#"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#);
    xml
}

pub(crate) fn presentation_rels(slide_count: usize) -> String {
    let mut rels = Relationships::new()
        .add(1, REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml")
        .add(2, REL_PRES_PROPS, "presProps.xml")
        .add(3, REL_VIEW_PROPS, "viewProps.xml")
        .add(4, REL_THEME, "theme/theme1.xml")
        .add(5, REL_TABLE_STYLES, "tableStyles.xml");
    for n in 1..=slide_count {
        rels = rels.add(
            PRESENTATION_FIXED_RELS + n,
            REL_SLIDE,
            &format!("slides/slide{n}.xml"),
        );
    }
    rels.finish()
}

pub(crate) fn pres_props() -> String {
    format!(r#"{XML_DECL}<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

pub(crate) fn view_props() -> String {
    format!(r#"{XML_DECL}<p:viewPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

pub(crate) fn table_styles() -> String {
    format!(
        r#"{XML_DECL}<a:tblStyleLst xmlns:a="{NS_A}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#
    )
}

/// The empty group-shape header every shape tree starts with.
const SP_TREE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

pub(crate) fn slide_master() -> String {
    format!(
        concat!(
            r#"{decl}<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            "<p:spTree>{header}</p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
            r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
            r#"hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "<p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles>",
            "</p:sldMaster>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        header = SP_TREE_HEADER,
    )
}

pub(crate) fn slide_master_rels() -> String {
    Relationships::new()
        .add(1, REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")
        .add(2, REL_THEME, "../theme/theme1.xml")
        .finish()
}

pub(crate) fn slide_layout() -> String {
    format!(
        concat!(
            r#"{decl}<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{header}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        header = SP_TREE_HEADER,
    )
}

pub(crate) fn slide_layout_rels() -> String {
    Relationships::new()
        .add(1, REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml")
        .finish()
}

pub(crate) fn slide(picture_name: &str, rect: Rect) -> String {
    format!(
        concat!(
            r#"{decl}<p:sld xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld><p:spTree>{header}"#,
            r#"<p:pic><p:nvPicPr><p:cNvPr id="2" name="Picture 1" descr="{name}"/>"#,
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        header = SP_TREE_HEADER,
        name = escape(picture_name),
        x = rect.x,
        y = rect.y,
        cx = rect.cx,
        cy = rect.cy,
    )
}

pub(crate) fn slide_rels(n: usize, format: ImageFormat) -> String {
    Relationships::new()
        .add(1, REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")
        .add(2, REL_IMAGE, &format!("../media/image{n}.{}", format.extension()))
        .finish()
}

pub(crate) fn theme() -> String {
    let mut xml = format!(r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="Office Theme"><a:themeElements>"#);

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    let scheme = [
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ];
    for (slot, rgb) in scheme {
        let _ = write!(xml, r#"<a:{slot}><a:srgbClr val="{rgb}"/></a:{slot}>"#);
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    for font in ["majorFont", "minorFont"] {
        let _ = write!(
            xml,
            r#"<a:{font}><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:{font}>"#
        );
    }
    xml.push_str("</a:fontScheme>");

    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    xml.push_str(r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#);
    xml.push_str(&solid.repeat(3));
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [9525, 25400, 38100] {
        let _ = write!(xml, r#"<a:ln w="{width}">{solid}</a:ln>"#);
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    xml.push_str(&"<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3));
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    xml.push_str(&solid.repeat(3));
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}
