#[macro_use]
extern crate clap;

use clap::Arg;
use std::process;

use sr32::{Memory, Processor, TRACE_BRANCH, TRACE_FETCH, TRACE_IO, TRACE_REGS};
use sr32emu::{load_image, load_test_data, report, setup_guest, HostDevice, TestData};

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("IMAGE")
                .help("Hex image to run")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("ARGS")
                .help("Arguments passed to the guest program")
                .index(2)
                .multiple(true),
        )
        .arg(
            Arg::with_name("testdata")
                .short("x")
                .takes_value(true)
                .value_name("FILE")
                .help("Load test vector data"),
        )
        .arg(
            Arg::with_name("trace-fetch")
                .long("tf")
                .help("Trace instruction fetches"),
        )
        .arg(
            Arg::with_name("trace-regs")
                .long("tr")
                .help("Trace register writes"),
        )
        .arg(
            Arg::with_name("trace-branch")
                .long("tb")
                .help("Trace branches"),
        )
        .arg(
            Arg::with_name("trace-io")
                .long("ti")
                .help("Trace IO reads & writes"),
        )
        .get_matches();

    let mut flags = 0;
    if matches.is_present("trace-fetch") {
        flags |= TRACE_FETCH;
    }
    if matches.is_present("trace-regs") {
        flags |= TRACE_REGS;
    }
    if matches.is_present("trace-branch") {
        flags |= TRACE_BRANCH;
    }
    if matches.is_present("trace-io") {
        flags |= TRACE_IO;
    }

    let data = match matches.value_of("testdata") {
        Some(path) => match load_test_data(path) {
            Ok(data) => data,
            Err(err) => {
                eprintln!("emu: cannot open: {}: {}", path, err);
                process::exit(1);
            }
        },
        None => TestData::default(),
    };

    let image = matches.value_of("IMAGE").unwrap();
    let args: Vec<String> = matches
        .values_of("ARGS")
        .map(|values| values.map(str::to_owned).collect())
        .unwrap_or_default();

    let mut memory = Memory::default();
    if let Err(err) = load_image(&mut memory, image) {
        eprintln!("emu: cannot open: {}: {}", image, err);
        process::exit(1);
    }

    let mut processor = Processor::new();
    processor.set_flags(flags);
    setup_guest(&mut processor, &mut memory, &args);

    let mut device = HostDevice::new(data, flags & TRACE_IO != 0);
    let exit = processor.run(&mut memory, &mut device);
    process::exit(report(exit, &processor, &memory));
}
