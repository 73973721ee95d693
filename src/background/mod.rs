pub mod temp_reaper;
