pub mod startup_worker;
