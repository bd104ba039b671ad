pub mod frame_pacer;
