use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct EvidenceRefs(Vec<String>);

impl EvidenceRefs {
    pub fn new(urls: Vec<String>) -> Self {
        Self(
            urls.into_iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
        )
    }

    pub fn parse(stored: Option<&str>) -> Self {
        let Some(raw) = stored.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        if raw.starts_with('[') {
            if let Ok(urls) = serde_json::from_str::<Vec<String>>(raw) {
                return Self::new(urls);
            }
        }
        Self(vec![raw.to_string()])
    }

    pub fn to_stored(&self) -> Option<String> {
        match self.0.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => serde_json::to_string(many).ok(),
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
