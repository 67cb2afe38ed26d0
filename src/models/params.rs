use serde::Deserialize;

/// Optional `YYYY-MM-DD` bounds for time-boxed reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DateRangeParams {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl DateRangeParams {
    pub fn new(start_date: Option<&str>, end_date: Option<&str>) -> Self {
        Self {
            start_date: start_date.map(str::to_string),
            end_date: end_date.map(str::to_string),
        }
    }

    pub fn start(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    pub fn end(&self) -> Option<&str> {
        self.end_date.as_deref()
    }
}
