mod log;

use log::Logging;
use msgpack::{Codec, Pack};
use tracing::{info, instrument};

struct Reading {
    sensor_id: i32,
    value: f64,
    tags: Vec<i32>,
}

impl Pack for Reading {
    fn pack(&self, codec: &mut Codec) {
        codec.add_pair(&"sensor_id", &self.sensor_id);
        codec.add_pair(&"value", &self.value);
        codec.add_pair_array(&"tags", &self.tags);
    }
}

#[instrument(skip_all, name = "trace_encode_decode_demo")]
fn run() {
    let reading = Reading { sensor_id: 7, value: 21.5, tags: vec![1, 2, 3] };

    let mut codec = Codec::new();
    codec.add_aggregate(&reading);
    let wire = codec.serialize();
    info!(bytes = wire.len(), "encoded reading");

    let mut reader = Codec::new();
    reader.deserialize(wire);
    let pair_count = reader.unpack_map().unwrap();
    for _ in 0..pair_count {
        let key = reader.get_value::<String>().unwrap();
        match key.as_str() {
            "sensor_id" => info!(sensor_id = reader.get_value::<i32>().unwrap()),
            "value" => info!(value = reader.get_value::<f64>().unwrap()),
            "tags" => {
                let tags: Vec<i32> = reader.get_array().unwrap();
                info!(?tags);
            }
            other => {
                info!(field = other, "skipping unknown field");
                reader.skip_value(1).unwrap();
            }
        }
    }
}

fn main() {
    let logging = Logging::new();
    logging.early_init();

    run();
}
