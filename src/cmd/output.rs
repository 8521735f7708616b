use anyhow::Result;
use serde::Serialize;

use reelfetch::{Caption, Stream, StreamKind};

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_stream(stream: &Stream) {
    let kind = match stream.kind() {
        StreamKind::Hls => "hls",
        StreamKind::File => "file",
    };
    println!("   Stream: {} ({kind})", stream.id);
    if let Some(url) = stream.primary_url() {
        println!("   URL: {url}");
    }
    if stream.proxy_depth > 0 {
        println!("   Proxy depth: {}", stream.proxy_depth);
    }
    for (name, value) in &stream.headers {
        println!("   Header: {name}: {value}");
    }
    print_captions(&stream.captions);
}

pub fn print_captions(captions: &[Caption]) {
    if captions.is_empty() {
        println!("   Captions: none");
        return;
    }
    println!("   Captions: {}", captions.len());
    for caption in captions {
        println!(
            "     [{}] {:?} {}",
            caption.language, caption.origin, caption.url
        );
    }
}
