/// Capacity of the sysName field.
pub const ROUTER_NAME_MAX: usize = 255;
/// Capacity of the sysDescr field.
pub const ROUTER_DESCR_MAX: usize = 255;
/// Capacity of the free-form initiation and termination data fields.
pub const ROUTER_DATA_MAX: usize = 4096;
/// Capacity of the termination reason text.
pub const TERM_REASON_TEXT_MAX: usize = 255;

/// One monitored router, scoped to one TCP connection.
///
/// Created when the connection is accepted, mutated by Initiation messages,
/// mutated and then retired by Termination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouterEntry {
    /// Source address of the monitored router, as accepted by the listener.
    pub src_addr: String,
    /// sysName reported in the Initiation message.
    pub name: String,
    /// sysDescr reported in the Initiation message.
    pub descr: String,
    /// Free-form Initiation information.
    pub initiate_data: String,
    /// Free-form Termination information.
    pub term_data: String,
    pub term_reason_code: u16,
    pub term_reason_text: String,
}

impl RouterEntry {
    pub fn new(src_addr: impl Into<String>) -> Self {
        RouterEntry {
            src_addr: src_addr.into(),
            ..Default::default()
        }
    }

    pub fn set_name(&mut self, value: &[u8]) {
        self.name = field_string(value, ROUTER_NAME_MAX);
    }

    pub fn set_descr(&mut self, value: &[u8]) {
        self.descr = field_string(value, ROUTER_DESCR_MAX);
    }

    pub fn set_initiate_data(&mut self, value: &[u8]) {
        self.initiate_data = field_string(value, ROUTER_DATA_MAX);
    }

    pub fn set_term_data(&mut self, value: &[u8]) {
        self.term_data = field_string(value, ROUTER_DATA_MAX);
    }

    pub fn set_term_reason(&mut self, code: u16, text: String) {
        self.term_reason_code = code;
        self.term_reason_text = field_string(text.as_bytes(), TERM_REASON_TEXT_MAX);
    }
}

/// Truncate to the field capacity, then widen each byte to a char the same
/// way the wire strings arrive (no UTF-8 assumption).
fn field_string(value: &[u8], cap: usize) -> String {
    value[..value.len().min(cap)]
        .iter()
        .map(|b| *b as char)
        .collect()
}
