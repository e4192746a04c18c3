fn main() {
    // Embeds GIT_COMMIT_HASH and friends into OUT_DIR/built.rs.
    built::write_built_file().expect("Failed to acquire build-time information");
}
