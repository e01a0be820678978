//! StreamGoal — Catalog View
//!
//! Pure, synchronous projections over fetched catalog rows:
//!   filter  → status tab, free-text query, competition / category selector
//!   sort    → live first, upcoming soonest, finished most recent
//!   card    → display projection with placeholders for missing joins
//!   format  → "Today, 19:00" style timestamps
//!
//! Nothing here touches the network; callers fetch through `catalog_store`
//! and hand the rows in.

pub mod card;
pub mod filter;
pub mod format;
pub mod sections;
pub mod sort;

pub use card::{CardAction, MatchCard};
pub use filter::{
    categories_of, competitions_of, filter_channels, filter_matches, ChannelFilter, MatchFilter, StatusTab,
};
pub use format::{format_date, format_match_time, format_relative_time, format_time};
pub use sections::{favorite_matches, home_sections, HomeSections, HOME_SECTION_LIMIT};
pub use sort::{compare_matches, sort_matches};
