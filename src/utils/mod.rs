pub mod calendar;
pub mod db_utils;
