fn main() {
    println!("cargo:rerun-if-env-changed=RCS_FIRMWARE_VERSION");

    // Host builds (tests, fuzzing) have no ESP-IDF environment to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
