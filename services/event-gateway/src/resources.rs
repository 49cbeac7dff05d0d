//! Descriptors for the event provider collections the gateway proxies.

use std::fmt;

const EVENT_FIELDS: &[&str] = &[
    "capacity",
    "close_date",
    "close_time",
    "created_at",
    "created_by",
    "description",
    "end_date",
    "end_time",
    "folder_id",
    "free_event",
    "hashtag",
    "id",
    "name",
    "organizer_id",
    "start_date",
    "start_time",
    "status",
    "target_attendance",
    "timezone",
    "type_id",
    "updated_at",
    "updated_by",
    "url",
    "webinar_url",
];

const DISCOUNT_FIELDS: &[&str] = &[
    "absolute_discount",
    "applicable_line_items",
    "capacity",
    "code",
    "created_at",
    "custom_fees",
    "event_id",
    "id",
    "notes",
    "percentage_discount",
    "sold_out_message",
    "type",
    "updated_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Events,
    RegTypes,
    Registrants,
    Discounts,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    /// Collection path under `/api/v1/`.
    pub path: &'static str,
    /// Noun used in `Failed to fetch <label>`.
    pub label: &'static str,
    pub error_code: &'static str,
    pub event_scoped: bool,
    pub fields: Option<&'static [&'static str]>,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Events,
        Resource::RegTypes,
        Resource::Registrants,
        Resource::Discounts,
    ];

    pub fn descriptor(self) -> ResourceDescriptor {
        match self {
            Resource::Events => ResourceDescriptor {
                path: "events",
                label: "events",
                error_code: "upstream_events",
                event_scoped: false,
                fields: Some(EVENT_FIELDS),
            },
            Resource::RegTypes => ResourceDescriptor {
                path: "reg-types",
                label: "reg types",
                error_code: "upstream_reg_types",
                event_scoped: true,
                fields: None,
            },
            Resource::Registrants => ResourceDescriptor {
                path: "registrants",
                label: "registrants",
                error_code: "upstream_registrants",
                event_scoped: true,
                fields: None,
            },
            Resource::Discounts => ResourceDescriptor {
                path: "discounts",
                label: "discounts",
                error_code: "upstream_discounts",
                event_scoped: true,
                fields: Some(DISCOUNT_FIELDS),
            },
        }
    }

    pub fn path(self) -> &'static str {
        self.descriptor().path
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl ResourceDescriptor {
    /// The only failure text callers see, e.g. `Failed to fetch reg types`.
    pub fn failure_message(&self) -> String {
        format!("Failed to fetch {}", self.label)
    }

    /// Query pairs for one upstream read. Event-scoped collections use `event_id`
    /// when it is present and non-empty, otherwise `default_event_id`.
    pub fn query_pairs(&self, event_id: Option<&str>, default_event_id: &str) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if self.event_scoped {
            let event_id = event_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .unwrap_or(default_event_id);
            pairs.push(("event_id", event_id.to_string()));
        }
        if let Some(fields) = self.fields {
            pairs.push(("fields", fields.join(",")));
        }
        pairs
    }
}
