pub mod county_lookup;
pub mod forecast;
pub mod image_resolver;
