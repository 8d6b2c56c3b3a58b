#![no_main]
use std::cell::RefCell;

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use streamtext::{
    MalformedPolicy, ReadOptions, StreamDecoder,
    chunk_utils::{ScriptedTransport, split_by},
    read_loop_with,
};

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

/// Fragments that exercise carry-over: whole multi-byte characters, their
/// prefixes, and byte patterns that look like sequence starts but are not.
static FRAGMENTS: &[&[u8]] = &[
    "é".as_bytes(),
    "€".as_bytes(),
    "👍".as_bytes(),
    "\u{FFFD}".as_bytes(),
    b"\xC3",
    b"\xE2\x82",
    b"\xF0\x9F\x91",
    b"\x80",
    b"\xC0\xAF",
    b"\xED\xA0\x80",
    b"\xF4\x90\x80\x80",
    b"\xFF",
];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Splice a random fragment into the input at a random offset.
fn splice_fragment(data: &mut [u8], size: usize, max_size: usize) -> usize {
    let fragment = with_rng(|rng| FRAGMENTS[rng.random_range(0..FRAGMENTS.len())]);
    if size + fragment.len() > max_size {
        return size;
    }
    let at = with_rng(|rng| rng.random_range(0..=size));
    data.copy_within(at..size, at + fragment.len());
    data[at..at + fragment.len()].copy_from_slice(fragment);
    size + fragment.len()
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    if seed % 3 == 0 {
        splice_fragment(data, size, max_size)
    } else {
        fuzzer_mutate(data, size, max_size)
    }
});

#[derive(Debug, Arbitrary)]
struct Setup {
    chunk: u8,
    scratch: Option<u8>,
    ignore: bool,
    split_seed: u32,
}

fn decoder(data: &[u8]) {
    let mut u = Unstructured::new(data);
    let Ok(setup) = Setup::arbitrary(&mut u) else {
        return;
    };
    let bytes = u.take_rest();

    let options = ReadOptions {
        chunk_capacity: 1 + usize::from(setup.chunk % 32),
        char_capacity: setup.scratch.map(|s| 1 + usize::from(s % 32)),
        malformed: if setup.ignore {
            MalformedPolicy::Ignore
        } else {
            MalformedPolicy::Replace
        },
    };
    let splits = vec![setup.split_seed as usize; bytes.len()];
    let chunks = split_by(bytes, &splits);

    let looped = read_loop_with(ScriptedTransport::new(&chunks), &options)
        .expect("scripted transport never fails");

    let mut stream = StreamDecoder::new(&options).expect("capacities are non-zero");
    for chunk in &chunks {
        stream.feed(chunk);
    }
    let fed = stream.finish();
    assert_eq!(looped, fed);

    let lossy = String::from_utf8_lossy(bytes);
    match options.malformed {
        MalformedPolicy::Replace => assert_eq!(looped, lossy),
        MalformedPolicy::Ignore => {
            // A genuine U+FFFD in the input can't be told apart.
            if bytes.windows(3).all(|w| w != "\u{FFFD}".as_bytes()) {
                assert_eq!(looped, lossy.replace('\u{FFFD}', ""));
            }
        }
    }
}

fuzz_target!(|data: &[u8]| decoder(data));
