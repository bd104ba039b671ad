cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        mod wasm;
        pub use self::wasm::frame_pacer::FramePacer;
    } else {
        mod native;
        pub use self::native::frame_pacer::FramePacer;
    }
}
