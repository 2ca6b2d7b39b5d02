pub mod impl_capability_probe;
