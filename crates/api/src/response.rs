//! Response envelope shared by the API handlers.

use serde::Serialize;

/// `{ "data": T }` envelope wrapped around every successful JSON response.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
