use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}
