use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhoneLookup {
    pub exists: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
