use crate::error::{ApiError, ApiResult};
use garde::Validate;
use movieshub_dal::ListingParams;

#[derive(Debug, Clone, Default, Validate, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct Paging {
    #[garde(range(min = 1))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
}

impl Paging {
    /// Without `page` and `page_size` the listing covers all records,
    /// `default_page_size` applies once paging is requested.
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let (offset, limit) = if self.page.is_none() && self.page_size.is_none() {
            (0, i64::MAX)
        } else {
            let page = self.page.unwrap_or(1);
            let page_size = self.page_size.unwrap_or(default_page_size);
            let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
            (offset as i64, i64::from(page_size))
        };
        let order = self
            .sort
            .map(|orderings| {
                orderings
                    .split(',')
                    .map(|name| {
                        let (field_name, descending) = match name.trim() {
                            "" => {
                                return Err(ApiError::InvalidQuery(
                                    "Empty ordering name".to_string(),
                                ))
                            }
                            name if name.len() > 100 => {
                                return Err(ApiError::InvalidQuery(
                                    "Ordering name too long".to_string(),
                                ))
                            }
                            name if name.starts_with('+') => (&name[1..], false),
                            name if name.starts_with('-') => (&name[1..], true),
                            name => (name, false),
                        };

                        let order = if descending {
                            movieshub_dal::Order::Desc(field_name.to_string())
                        } else {
                            movieshub_dal::Order::Asc(field_name.to_string())
                        };

                        Ok(order)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(ListingParams {
            offset,
            limit,
            order,
        })
    }
}
