pub mod download_links;
pub mod episode_rosters;
pub mod title_details;
pub mod title_summaries;
pub mod user_lists;
pub mod users;
