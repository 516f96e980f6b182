pub mod error;
pub mod source;
pub mod types;

pub use error::{Error, Result};
pub use source::ArticleSource;
pub use types::{
    parse_batch, parse_timestamp, Article, ArticleId, FetchQuery, RawArticle, SectionName, SortKey,
};
