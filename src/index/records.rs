//! Typed entity records for the nine travel entity kinds
//!
//! Each record variant carries the descriptive fields its kind supports
//! and knows how to render itself into the Chinese value content stored
//! in the key-value index. The variant tag doubles as the entity type
//! string used throughout retrieval metadata.

use std::collections::HashMap;

use crate::core::GraphNode;

/// A raw travel entity, tagged by kind
///
/// Records usually originate from [`EntityRecord::from_node`], which maps
/// a labelled graph node onto the matching variant. Optional fields stay
/// `None` when the source node lacks the property, and the renderer skips
/// them rather than emitting empty lines.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "entity_type")]
pub enum EntityRecord {
    /// A city, the central hub most other entities attach to
    City {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        best_time: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consumption_level: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        highlights: Option<String>,
    },
    /// A top-level geographic region
    Region {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        best_time: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consumption_level: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        highlights: Option<String>,
    },
    /// A sub-area within a region
    SubRegion {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_region: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// A sight or scenic spot
    Attraction {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket_price: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },
    /// A local dish or cuisine
    Food {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// A restaurant venue
    Restaurant {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },
    /// An accommodation option
    Hotel {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        area: Option<String>,
    },
    /// A recurring festival or event
    Festival {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        held_time: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// A regional specialty product
    Specialty {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        city: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// Node labels the record model understands, in index build order
pub const SUPPORTED_LABELS: [&str; 9] = [
    "City",
    "Region",
    "SubRegion",
    "Attraction",
    "Food",
    "Restaurant",
    "Hotel",
    "Festival",
    "Specialty",
];

impl EntityRecord {
    /// Stable identifier of the underlying node
    pub fn id(&self) -> &str {
        match self {
            Self::City { id, .. }
            | Self::Region { id, .. }
            | Self::SubRegion { id, .. }
            | Self::Attraction { id, .. }
            | Self::Food { id, .. }
            | Self::Restaurant { id, .. }
            | Self::Hotel { id, .. }
            | Self::Festival { id, .. }
            | Self::Specialty { id, .. } => id,
        }
    }

    /// Display name of the entity, used as its index key
    pub fn name(&self) -> &str {
        match self {
            Self::City { name, .. }
            | Self::Region { name, .. }
            | Self::SubRegion { name, .. }
            | Self::Attraction { name, .. }
            | Self::Food { name, .. }
            | Self::Restaurant { name, .. }
            | Self::Hotel { name, .. }
            | Self::Festival { name, .. }
            | Self::Specialty { name, .. } => name,
        }
    }

    /// Entity type tag matching the graph label
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::City { .. } => "City",
            Self::Region { .. } => "Region",
            Self::SubRegion { .. } => "SubRegion",
            Self::Attraction { .. } => "Attraction",
            Self::Food { .. } => "Food",
            Self::Restaurant { .. } => "Restaurant",
            Self::Hotel { .. } => "Hotel",
            Self::Festival { .. } => "Festival",
            Self::Specialty { .. } => "Specialty",
        }
    }

    /// Render the value content block stored in the index
    ///
    /// The first line names the entity with a full-width colon; the
    /// remaining lines carry one labelled field each and are omitted
    /// entirely when the field is absent.
    pub fn value_content(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self {
            Self::City {
                name,
                city_type,
                description,
                best_time,
                consumption_level,
                highlights,
                ..
            } => {
                parts.push(format!("城市名称：{name}"));
                push_field(&mut parts, "类型", city_type);
                push_field(&mut parts, "描述", description);
                push_field(&mut parts, "最佳旅游时间", best_time);
                push_field(&mut parts, "消费水平", consumption_level);
                push_field(&mut parts, "特色景点", highlights);
            }
            Self::Region {
                name,
                region_type,
                description,
                best_time,
                consumption_level,
                highlights,
                ..
            } => {
                parts.push(format!("地区名称：{name}"));
                push_field(&mut parts, "类型", region_type);
                push_field(&mut parts, "描述", description);
                push_field(&mut parts, "最佳旅游时间", best_time);
                push_field(&mut parts, "消费水平", consumption_level);
                push_field(&mut parts, "特色景点", highlights);
            }
            Self::SubRegion {
                name,
                parent_region,
                description,
                ..
            } => {
                parts.push(format!("子地区名称：{name}"));
                push_field(&mut parts, "所属地区", parent_region);
                push_field(&mut parts, "描述", description);
            }
            Self::Attraction {
                name,
                city,
                category,
                description,
                ticket_price,
                address,
                ..
            } => {
                parts.push(format!("景点名称：{name}"));
                push_field(&mut parts, "所在城市", city);
                push_field(&mut parts, "景点类型", category);
                push_field(&mut parts, "描述", description);
                push_field(&mut parts, "门票价格", ticket_price);
                push_field(&mut parts, "地址", address);
            }
            Self::Food {
                name,
                city,
                category,
                description,
                ..
            } => {
                parts.push(format!("美食名称：{name}"));
                push_field(&mut parts, "所在城市", city);
                push_field(&mut parts, "美食类型", category);
                push_field(&mut parts, "描述", description);
            }
            Self::Restaurant {
                name,
                city,
                category,
                description,
                address,
                ..
            } => {
                parts.push(format!("餐厅名称：{name}"));
                push_field(&mut parts, "所在城市", city);
                push_field(&mut parts, "餐厅类型", category);
                push_field(&mut parts, "描述", description);
                push_field(&mut parts, "地址", address);
            }
            Self::Hotel {
                name,
                city,
                category,
                description,
                area,
                ..
            } => {
                parts.push(format!("住宿名称：{name}"));
                push_field(&mut parts, "所在城市", city);
                push_field(&mut parts, "住宿类型", category);
                push_field(&mut parts, "描述", description);
                push_field(&mut parts, "所在区域", area);
            }
            Self::Festival {
                name,
                city,
                held_time,
                description,
                ..
            } => {
                parts.push(format!("节庆名称：{name}"));
                push_field(&mut parts, "所在城市", city);
                push_field(&mut parts, "举办时间", held_time);
                push_field(&mut parts, "描述", description);
            }
            Self::Specialty {
                name,
                city,
                category,
                description,
                ..
            } => {
                parts.push(format!("特产名称：{name}"));
                push_field(&mut parts, "所在城市", city);
                push_field(&mut parts, "特产类型", category);
                push_field(&mut parts, "描述", description);
            }
        }
        parts.join("\n")
    }

    /// Snapshot of the descriptive fields actually present
    ///
    /// Keys use the source property names so the snapshot round-trips
    /// with [`EntityRecord::from_node`].
    pub fn properties(&self) -> HashMap<String, String> {
        let mut props = HashMap::new();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                props.insert(key.to_string(), v.clone());
            }
        };
        match self {
            Self::City {
                city_type,
                description,
                best_time,
                consumption_level,
                highlights,
                ..
            } => {
                put("type", city_type);
                put("description", description);
                put("best_time", best_time);
                put("consumption_level", consumption_level);
                put("highlights", highlights);
            }
            Self::Region {
                region_type,
                description,
                best_time,
                consumption_level,
                highlights,
                ..
            } => {
                put("type", region_type);
                put("description", description);
                put("best_time", best_time);
                put("consumption_level", consumption_level);
                put("highlights", highlights);
            }
            Self::SubRegion {
                parent_region,
                description,
                ..
            } => {
                put("parent_region", parent_region);
                put("description", description);
            }
            Self::Attraction {
                city,
                category,
                description,
                ticket_price,
                address,
                ..
            } => {
                put("city", city);
                put("category", category);
                put("description", description);
                put("ticket_price", ticket_price);
                put("address", address);
            }
            Self::Food {
                city,
                category,
                description,
                ..
            } => {
                put("city", city);
                put("category", category);
                put("description", description);
            }
            Self::Restaurant {
                city,
                category,
                description,
                address,
                ..
            } => {
                put("city", city);
                put("category", category);
                put("description", description);
                put("address", address);
            }
            Self::Hotel {
                city,
                category,
                description,
                area,
                ..
            } => {
                put("city", city);
                put("category", category);
                put("description", description);
                put("area", area);
            }
            Self::Festival {
                city,
                held_time,
                description,
                ..
            } => {
                put("city", city);
                put("time", held_time);
                put("description", description);
            }
            Self::Specialty {
                city,
                category,
                description,
                ..
            } => {
                put("city", city);
                put("category", category);
                put("description", description);
            }
        }
        props
    }

    /// Map a labelled graph node onto the matching record variant
    ///
    /// Returns `None` when the node's primary label is not one of the
    /// nine supported entity kinds. Property lookups tolerate absence;
    /// the id and name are taken verbatim from the node.
    pub fn from_node(node: &GraphNode) -> Option<Self> {
        let id = node.node_id.to_string();
        let name = node.name.clone();
        let prop = |key: &str| node.property(key).map(str::to_string);

        let record = match node.primary_label() {
            "City" => Self::City {
                id,
                name,
                city_type: prop("type"),
                description: prop("description"),
                best_time: prop("best_time"),
                consumption_level: prop("consumption_level"),
                highlights: prop("highlights"),
            },
            "Region" => Self::Region {
                id,
                name,
                region_type: prop("type"),
                description: prop("description"),
                best_time: prop("best_time"),
                consumption_level: prop("consumption_level"),
                highlights: prop("highlights"),
            },
            "SubRegion" => Self::SubRegion {
                id,
                name,
                parent_region: prop("parent_region"),
                description: prop("description"),
            },
            "Attraction" => Self::Attraction {
                id,
                name,
                city: prop("city"),
                category: prop("category"),
                description: prop("description"),
                ticket_price: prop("ticket_price"),
                address: prop("address"),
            },
            "Food" => Self::Food {
                id,
                name,
                city: prop("city"),
                category: prop("category"),
                description: prop("description"),
            },
            "Restaurant" => Self::Restaurant {
                id,
                name,
                city: prop("city"),
                category: prop("category"),
                description: prop("description"),
                address: prop("address"),
            },
            "Hotel" => Self::Hotel {
                id,
                name,
                city: prop("city"),
                category: prop("category"),
                description: prop("description"),
                area: prop("area"),
            },
            "Festival" => Self::Festival {
                id,
                name,
                city: prop("city"),
                held_time: prop("time"),
                description: prop("description"),
            },
            "Specialty" => Self::Specialty {
                id,
                name,
                city: prop("city"),
                category: prop("category"),
                description: prop("description"),
            },
            _ => return None,
        };
        Some(record)
    }
}

fn push_field(parts: &mut Vec<String>, label: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            parts.push(format!("{label}: {v}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn west_lake() -> EntityRecord {
        EntityRecord::Attraction {
            id: "attraction_west_lake".to_string(),
            name: "西湖".to_string(),
            city: Some("杭州".to_string()),
            category: Some("自然风光".to_string()),
            description: Some("杭州最著名的景点".to_string()),
            ticket_price: Some("免费".to_string()),
            address: None,
        }
    }

    #[test]
    fn test_attraction_value_content_layout() {
        let content = west_lake().value_content();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "景点名称：西湖");
        assert_eq!(lines[1], "所在城市: 杭州");
        assert_eq!(lines[2], "景点类型: 自然风光");
        assert_eq!(lines[3], "描述: 杭州最著名的景点");
        assert_eq!(lines[4], "门票价格: 免费");
        // absent address line is skipped, not emitted empty
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_city_value_content_skips_missing_fields() {
        let city = EntityRecord::City {
            id: "city_hangzhou".to_string(),
            name: "杭州".to_string(),
            city_type: None,
            description: Some("历史文化名城".to_string()),
            best_time: Some("春秋两季".to_string()),
            consumption_level: None,
            highlights: Some("西湖、灵隐寺".to_string()),
        };

        let content = city.value_content();
        assert_eq!(
            content,
            "城市名称：杭州\n描述: 历史文化名城\n最佳旅游时间: 春秋两季\n特色景点: 西湖、灵隐寺"
        );
    }

    #[test]
    fn test_accessors_cover_every_variant() {
        let record = west_lake();
        assert_eq!(record.id(), "attraction_west_lake");
        assert_eq!(record.name(), "西湖");
        assert_eq!(record.entity_type(), "Attraction");

        let festival = EntityRecord::Festival {
            id: "festival_1".to_string(),
            name: "西湖桂花节".to_string(),
            city: Some("杭州".to_string()),
            held_time: Some("每年9月至10月".to_string()),
            description: None,
        };
        assert_eq!(festival.entity_type(), "Festival");
        assert!(festival.value_content().contains("举办时间: 每年9月至10月"));
    }

    #[test]
    fn test_from_node_maps_labelled_properties() {
        let node = GraphNode::new(
            "attraction_west_lake",
            vec!["Attraction".to_string()],
            "西湖",
        )
        .with_property("city", "杭州")
        .with_property("category", "自然风光")
        .with_property("ticket_price", "免费");

        let record = EntityRecord::from_node(&node).unwrap();
        assert_eq!(record.entity_type(), "Attraction");
        assert_eq!(record.name(), "西湖");
        assert!(record.value_content().contains("门票价格: 免费"));
        assert_eq!(record.properties().get("city").map(String::as_str), Some("杭州"));
    }

    #[test]
    fn test_from_node_rejects_unknown_label() {
        let node = GraphNode::new("x_1", vec!["Airline".to_string()], "东方航空");
        assert!(EntityRecord::from_node(&node).is_none());
    }

    #[test]
    fn test_record_serialization_is_tagged_by_entity_type() {
        let json = serde_json::to_value(west_lake()).unwrap();
        assert_eq!(json["entity_type"], "Attraction");
        assert_eq!(json["name"], "西湖");
    }
}
