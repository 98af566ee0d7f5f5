use serde::Serialize;
use serde_json::{json, Value};

pub const FONT_FAMILY: &str = "\"Gotham\", Arial, sans-serif";
pub const TEXT_COLOR: &str = "#171A20";
pub const GRID_COLOR: &str = "#E0E0E0";
pub const ACCENT: &str = "#E31937";

/// Line colours, cycled per region.
pub const PALETTE: [&str; 10] = [
    "#E31937", "#171A20", "#5C5E62", "#8C8C8C", "#B8B8B8", "#CC1A3C", "#2A2D35", "#707277", "#A0A0A0",
    "#D0D0D0",
];

pub fn palette_color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

/// A Plotly figure, rendered client side by plotly.js.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Figure {
    pub fn new(data: Vec<Value>, layout: Value) -> Self {
        Figure { data, layout }
    }
}

/// Layout settings shared by every chart; `extra` keys overwrite the defaults.
pub fn layout(height: u32, extra: Value) -> Value {
    let mut base = json!({
        "height": height,
        "paper_bgcolor": "#FFFFFF",
        "plot_bgcolor": "#F9F9F9",
        "font": { "family": FONT_FAMILY, "size": 12, "color": TEXT_COLOR },
        "margin": { "l": 60, "r": 40, "t": 40, "b": 50 },
        "legend": {
            "bgcolor": "rgba(255,255,255,0.8)",
            "bordercolor": GRID_COLOR,
            "borderwidth": 1
        }
    });
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        for (key, value) in extra {
            base.insert(key, value);
        }
    }
    base
}

pub fn axis(title: &str) -> Value {
    json!({
        "title": { "text": title },
        "showgrid": true,
        "gridcolor": GRID_COLOR,
        "linecolor": GRID_COLOR
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_layout_keys_win() {
        let l = layout(500, json!({ "height": 300, "barmode": "stack" }));
        assert_eq!(l["height"], 300);
        assert_eq!(l["barmode"], "stack");
        assert_eq!(l["font"]["color"], TEXT_COLOR);
        assert_eq!(palette_color(11), PALETTE[1]);
    }
}
