pub mod areas;
pub mod completions;
pub mod db_path;
pub mod show;
pub mod tags;
pub mod tasks;
pub mod view;
