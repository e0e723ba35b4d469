use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Box around a detected object, in the convention the detector used
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundingBox {
    Corners {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
    Xywh {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// One object reported by the detector, kept in detector order.
///
/// Serialized as a bare label string when the detector gave nothing but a
/// label, and as an object otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireDetection")]
pub struct Detection {
    pub label: String,
    pub confidence: Option<f32>,
    pub bbox: Option<BoundingBox>,
}

impl Detection {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: None,
            bbox: None,
        }
    }

    pub fn located(label: impl Into<String>, confidence: Option<f32>, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox: Some(bbox),
        }
    }
}

impl Serialize for Detection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.confidence.is_none() && self.bbox.is_none() {
            return serializer.serialize_str(&self.label);
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("label", &self.label)?;
        if let Some(confidence) = self.confidence {
            map.serialize_entry("confidence", &confidence)?;
        }
        if let Some(bbox) = &self.bbox {
            map.serialize_entry("bbox", bbox)?;
        }
        map.end()
    }
}

/// Shapes accepted from detectors: plain labels or objects with flat or
/// nested coordinates
#[derive(Deserialize)]
#[serde(untagged)]
enum WireDetection {
    Label(String),
    Object(WireObject),
}

#[derive(Deserialize)]
struct WireObject {
    #[serde(alias = "name", alias = "class", alias = "class_name")]
    label: String,
    #[serde(default, alias = "conf", alias = "score")]
    confidence: Option<f32>,
    #[serde(default, alias = "box")]
    bbox: Option<WireBox>,
    #[serde(flatten)]
    coords: WireCoords,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBox {
    /// `[xmin, ymin, xmax, ymax]`
    Array([f64; 4]),
    Object(WireCoords),
}

#[derive(Default, Deserialize)]
struct WireCoords {
    #[serde(default, alias = "x_min", alias = "x1")]
    xmin: Option<f64>,
    #[serde(default, alias = "y_min", alias = "y1")]
    ymin: Option<f64>,
    #[serde(default, alias = "x_max", alias = "x2")]
    xmax: Option<f64>,
    #[serde(default, alias = "y_max", alias = "y2")]
    ymax: Option<f64>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default, alias = "w")]
    width: Option<f64>,
    #[serde(default, alias = "h")]
    height: Option<f64>,
}

impl WireCoords {
    fn to_box(&self) -> Option<BoundingBox> {
        if let (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) =
            (self.xmin, self.ymin, self.xmax, self.ymax)
        {
            return Some(BoundingBox::Corners {
                xmin,
                ymin,
                xmax,
                ymax,
            });
        }

        match (self.x, self.y, self.width, self.height) {
            (Some(x), Some(y), Some(width), Some(height)) => Some(BoundingBox::Xywh {
                x,
                y,
                width,
                height,
            }),
            _ => None,
        }
    }
}

impl From<WireDetection> for Detection {
    fn from(wire: WireDetection) -> Self {
        match wire {
            WireDetection::Label(label) => Detection::label(label),
            WireDetection::Object(obj) => {
                let bbox = match obj.bbox {
                    Some(WireBox::Array([xmin, ymin, xmax, ymax])) => Some(BoundingBox::Corners {
                        xmin,
                        ymin,
                        xmax,
                        ymax,
                    }),
                    Some(WireBox::Object(coords)) => coords.to_box(),
                    None => obj.coords.to_box(),
                };

                Detection {
                    label: obj.label,
                    confidence: obj.confidence,
                    bbox,
                }
            }
        }
    }
}
