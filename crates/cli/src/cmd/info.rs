use pinfold_lib::platform::{paths, platform_triple};

pub fn cmd_info() {
  println!("System:");
  match platform_triple() {
    Some(triple) => println!("Platform: {}", triple),
    _ => println!("Could not detect platform."),
  }
  println!("Cache: {}", paths::cache_dir().display());
}
