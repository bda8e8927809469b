//! Benchmarks for inbound frame classification, the per-message hot path of a listener.
#![allow(
    clippy::exhaustive_structs,
    clippy::exhaustive_enums,
    reason = "Alloy sol! macro generates code that triggers these lints"
)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use evm_log_listener::SolEventDecoder;
use evm_log_listener::rpc::{Inbound, LogFilter, SubscriptionProtocol};
use evm_log_listener::types::{address, b256};
use evm_log_listener::ws::Decoder as _;

alloy::sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
}

const NOTIFICATION: &str = r#"{
    "jsonrpc": "2.0",
    "method": "eth_subscription",
    "params": {
        "subscription": "0x9cef478923ff08bf67fde6c64013158d",
        "result": {
            "address": "0x2791bca1f2de4661ed88a30c99a7a9449aa84174",
            "topics": [
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                "0x0000000000000000000000001111111111111111111111111111111111111111",
                "0x0000000000000000000000002222222222222222222222222222222222222222"
            ],
            "data": "0x00000000000000000000000000000000000000000000000000000000000003e8",
            "blockNumber": "0x1b4",
            "blockHash": "0x8243343df08b9751f5ca0c5f8c9c0460d8a9b6351066fae0acbd4d3e776de8bb",
            "transactionHash": "0x5bd6de5b4e6d7f9cb7e2b0a6b9a4a1e04e2e2fb1e3e2c1f0d9f4e4c3b2a19081",
            "transactionIndex": "0x0",
            "logIndex": "0x3",
            "removed": false
        }
    }
}"#;

const STALE_NOTIFICATION: &str = r#"{
    "jsonrpc": "2.0",
    "method": "eth_subscription",
    "params": { "subscription": "0xdeadbeef", "result": {} }
}"#;

const PONG: &str = r#"{"jsonrpc":"2.0","id":2,"result":true}"#;

fn subscribed() -> SubscriptionProtocol {
    let mut protocol = SubscriptionProtocol::new(LogFilter::new(
        address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
        [b256!("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")],
    ));
    protocol
        .subscribe_request()
        .expect("Subscribe request should encode");
    let confirmed = protocol.handle(r#"{"jsonrpc":"2.0","id":1,"result":"0x9cef478923ff08bf67fde6c64013158d"}"#);
    assert!(matches!(confirmed, Inbound::Subscribed(_)), "Subscription should be confirmed");
    protocol
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocol/classify");

    let mut protocol = subscribed();
    group.throughput(Throughput::Bytes(NOTIFICATION.len() as u64));
    group.bench_function("notification", |b| {
        b.iter(|| {
            let inbound = protocol.handle(std::hint::black_box(NOTIFICATION));
            assert!(matches!(inbound, Inbound::Log(_)), "Notification should route");
        });
    });

    group.throughput(Throughput::Bytes(STALE_NOTIFICATION.len() as u64));
    group.bench_function("stale_notification", |b| {
        b.iter(|| protocol.handle(std::hint::black_box(STALE_NOTIFICATION)));
    });

    group.throughput(Throughput::Bytes(PONG.len() as u64));
    group.bench_function("pong", |b| {
        b.iter(|| {
            protocol
                .keep_alive_request()
                .expect("Probe should encode");
            protocol.handle(std::hint::black_box(PONG))
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder");

    let Inbound::Log(log) = subscribed().handle(NOTIFICATION) else {
        panic!("Notification should route");
    };
    let decoder = SolEventDecoder::<Transfer>::new();

    group.bench_function("SolEventDecoder<Transfer>", |b| {
        b.iter(|| {
            decoder
                .decode(std::hint::black_box(&log))
                .expect("Transfer should decode")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_decode);
criterion_main!(benches);
