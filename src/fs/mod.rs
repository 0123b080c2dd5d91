pub mod atomic;
pub mod meta;
pub mod paths;
pub mod tree;

pub use atomic::{fsync_parent_dir, open_dir_nofollow, publish_new, write_file_atomic};
pub use meta::{kind_of, node_exists, sha256_hex, sha256_hex_of};
pub use paths::{absolutize, canonicalize_existing_prefix, is_within, normalize_lexical};
pub use tree::{child_names, clear_dir, walk, NodeKind, TreeNode};
