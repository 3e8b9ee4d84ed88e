use crate::element::{Content, Element};
use crate::model::Meta;
use crate::pipeline::BoxLayout;
use crate::slug::SlugLayout;
use serde_json::{Value, json};

fn element_json(e: &Element) -> Value {
    let mut v = json!({
        "name": e.name,
        "frame": {"x": e.position.x, "y": e.position.y, "w": e.size.width, "h": e.size.height},
        "scale": e.cumulative_scale(),
        "rotated": e.rotated,
        "critical": e.critical,
    });
    if let Some(id) = e.group_id {
        v["groupId"] = json!(id);
    }
    if let Content::Text { lines, style } = &e.content {
        v["text"] = json!({"lines": lines, "font": style.font, "size": style.size * e.cumulative_scale()});
    }
    v
}

/// Serialize a box layout as `{ geometry, elements, suppressed, diagnostics, stats, slugs?, meta }`.
/// Element frames are board coordinates; `geometry.canvas_origin` maps them onto the canvas.
pub fn to_json(layout: &BoxLayout) -> Value {
    let elements: Vec<Value> = layout.placed.iter().map(element_json).collect();
    let suppressed: Vec<Value> = layout
        .suppressed
        .iter()
        .map(|e| json!({"name": e.name, "critical": e.critical}))
        .collect();
    let mut doc = json!({
        "name": layout.name,
        "geometry": &layout.geometry,
        "elements": elements,
        "suppressed": suppressed,
        "diagnostics": &layout.diagnostics,
        "stats": &layout.stats,
        "meta": Meta::default(),
    });
    if let Some(slugs) = &layout.slugs {
        doc["slugs"] = slugs_to_json(slugs);
    }
    doc
}

/// Serialize slug sheets as `{ sheets: [{ index, width, height, slugs: [...] }], stats, meta }`.
pub fn slugs_to_json(layout: &SlugLayout) -> Value {
    let sheets: Vec<Value> = (0..layout.num_sheets)
        .map(|sheet| {
            let slugs: Vec<Value> = layout
                .slugs
                .iter()
                .enumerate()
                .filter(|(_, s)| s.sheet_index == sheet)
                .map(|(i, s)| {
                    let members: Vec<Value> = layout
                        .placements
                        .iter()
                        .filter(|p| p.slug == i)
                        .map(|p| element_json(&p.element))
                        .collect();
                    json!({
                        "key": s.key.to_string(),
                        "frame": {"x": s.frame.x, "y": s.frame.y, "w": s.frame.w, "h": s.frame.h},
                        "marks": &s.marks,
                        "elements": members,
                    })
                })
                .collect();
            json!({
                "index": sheet,
                "width": layout.sheet.width,
                "height": layout.sheet.height,
                "slugs": slugs,
            })
        })
        .collect();
    json!({"sheets": sheets, "stats": layout.stats(), "meta": Meta::default()})
}

#[derive(serde::Deserialize)]
struct FrameIn {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementIn {
    name: String,
    frame: FrameIn,
    #[serde(default)]
    rotated: bool,
    #[serde(default)]
    critical: bool,
    #[serde(default)]
    group_id: Option<u32>,
}

/// Rebuilds the placed elements of a document written by [`to_json`], enough
/// to run another slug pass over them.
pub fn placed_from_json(doc: &Value) -> crate::error::Result<Vec<Element>> {
    let items = doc
        .get("elements")
        .cloned()
        .ok_or_else(|| crate::error::DielineError::InvalidInput("missing 'elements'".into()))?;
    let items: Vec<ElementIn> = serde_json::from_value(items)?;
    Ok(items
        .into_iter()
        .map(|e| {
            let mut el = Element::new(e.name, e.frame.x, e.frame.y, e.frame.w, e.frame.h)
                .rotated(e.rotated)
                .critical(e.critical);
            el.group_id = e.group_id;
            el
        })
        .collect())
}
