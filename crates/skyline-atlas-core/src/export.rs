use serde_json::{Value, json};

use crate::model::{AtlasMeta, AtlasSnapshot};

/// Serialize pages as `{ pages: [...], meta }`.
///
/// Each frame carries its pixel rectangle plus normalised `uv` coordinates so
/// engines can sample it without knowing the page size.
pub fn to_json(pages: &[AtlasSnapshot], meta: &AtlasMeta) -> Value {
    let pages_val = pages
        .iter()
        .map(|p| {
            let frames: Vec<Value> = p
                .regions
                .iter()
                .map(|nr| {
                    let r = &nr.region;
                    let [u0, v0, u1, v1] = r.tex_coords(p.width, p.height);
                    json!({
                        "key": nr.key,
                        "frame": {"x": r.x, "y": r.y, "w": r.w, "h": r.h},
                        "uv": {"u0": u0, "v0": v0, "u1": u1, "v1": v1},
                    })
                })
                .collect();
            json!({
                "id": p.id,
                "width": p.width,
                "height": p.height,
                "depth": p.depth.channels(),
                "used": p.used,
                "frames": frames,
            })
        })
        .collect::<Vec<_>>();
    json!({ "pages": pages_val, "meta": meta })
}

/// Flatten frames keyed by name with the owning page id.
pub fn to_json_hash(pages: &[AtlasSnapshot], meta: &AtlasMeta) -> Value {
    let mut frames = serde_json::Map::new();
    for page in pages {
        for nr in &page.regions {
            let r = &nr.region;
            frames.insert(
                nr.key.clone(),
                json!({
                    "frame": {"x": r.x, "y": r.y, "w": r.w, "h": r.h},
                    "page": page.id,
                    "pageSize": {"w": page.width, "h": page.height},
                }),
            );
        }
    }
    json!({ "frames": frames, "meta": meta })
}
