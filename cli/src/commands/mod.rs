mod cache;
mod helpers;
mod log;
mod meal;
mod summary;

pub(crate) use cache::{cmd_cache_clear, cmd_cache_show};
pub(crate) use log::cmd_add;
pub(crate) use meal::{cmd_clear, cmd_delete};
pub(crate) use summary::{cmd_chart, cmd_list};
