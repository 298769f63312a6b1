pub mod chatdtos;
pub mod gigdtos;
pub mod jobdtos;
pub mod orderdtos;
pub mod userdtos;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

impl RequestQueryDto {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1) as u32
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(20)
    }

    pub fn offset(&self) -> i64 {
        (self.page().max(1) as i64 - 1) * self.limit() as i64
    }
}
