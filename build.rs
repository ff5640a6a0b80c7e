//! Build script for texdupe
//!
//! Windows: embeds the application manifest so archive trees with paths
//! longer than 260 characters can be walked. The manifest (`texdupe.manifest`)
//! sets `longPathAware=true`, which takes effect together with the
//! Windows 10 v1607+ registry setting.
//!
//! On other platforms the script does nothing.

fn main() {
    #[cfg(windows)]
    {
        // The .rc file references the manifest as an RT_MANIFEST resource
        embed_resource::compile("texdupe.rc", embed_resource::NONE);

        println!("cargo:rerun-if-changed=texdupe.rc");
        println!("cargo:rerun-if-changed=texdupe.manifest");
    }
}
