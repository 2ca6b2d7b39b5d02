pub mod resolve_save_path;
