use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> FetchState<T> {
    pub fn ready(data: T) -> Self {
        Self { data: Some(data), loading: false, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { data: None, loading: false, error: Some(message.into()) }
    }

    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ready(data),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}
