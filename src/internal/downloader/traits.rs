pub mod capability_probe;
