pub mod s3_stub;
