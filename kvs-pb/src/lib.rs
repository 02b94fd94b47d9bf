tonic::include_proto!("kvs");

pub const FILE_DESCRIPTOR_SET: &[u8] =
    tonic::include_file_descriptor_set!("kvs_descriptor");
