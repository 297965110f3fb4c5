/*
 * rawspeed - bin/diag.rs
 *
 * Copyright (C) 2024 The rawspeed-rs authors
 *
 * This library is free software: you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public License
 * as published by the Free Software Foundation, either version 3 of
 * the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library.  If not, see
 * <http://www.gnu.org/licenses/>.
 */

//! Command-line container/format inspector, grounded on the teacher's
//! `bin/ordiag.rs`: print what the TIFF/IFD graph and format selector
//! see for each file named on the command line, without running a full
//! decode.

use getopts::Options;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use rawspeed::factory::{self, Format};
use rawspeed::tiff::{tag, Container, Ifd};

fn describe_format(f: Format) -> &'static str {
    match f {
        Format::Dng => "DNG",
        Format::CanonCr2Crw => "Canon CR2/CRW",
        Format::NikonNef => "Nikon NEF",
        Format::SonyArw => "Sony ARW",
        Format::PentaxPef => "Pentax PEF",
        Format::OlympusOrf => "Olympus ORF",
        Format::SamsungSrw => "Samsung SRW",
        Format::PanasonicRw2 => "Panasonic RW2",
        Format::Hasselblad3fr => "Hasselblad 3FR",
        Format::SinarSti => "Sinar STI",
        Format::KodakLegacy => "Kodak legacy CR2-OLD",
    }
}

fn process_file(path: &str) {
    info!("Diags {}", path);
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            println!("Failed to read {path}: {e}");
            return;
        }
    };

    let container = match Container::parse(&bytes) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to parse {path}: {e}");
            return;
        }
    };

    println!("Root IFDs: {}", container.directories().len());
    println!("Make: {:?}", container.make());
    println!("Model: {:?}", container.model());

    match factory::select_format(&container) {
        Some(fmt) => println!("Selected format: {}", describe_format(fmt)),
        None => println!("No format selector rule matched"),
    }

    for dir in container.directories() {
        if let (Some(w), Some(h)) = (dir.entry_u32(tag::IMAGE_WIDTH), dir.entry_u32(tag::IMAGE_LENGTH)) {
            println!("IFD dimensions: {w}x{h}");
        }
    }
}

pub fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut opts = Options::new();
    opts.optflag("d", "", "Debug logging");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => panic!("{}", f.to_string()),
    };

    let loglevel = if matches.opt_present("d") {
        LevelFilter::Debug
    } else {
        LevelFilter::Error
    };
    SimpleLogger::new()
        .with_module_level("rawspeed", loglevel)
        .init()
        .unwrap();

    for name in matches.free.iter() {
        process_file(name);
    }
}
