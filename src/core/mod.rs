pub mod stt;
