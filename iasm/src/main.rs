#[macro_use]
extern crate clap;

use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use clap::Arg;

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => writeln!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
        }
    }
}

fn main() {
    // Parse command line arguments
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Base names of the source files to assemble (without the .as extension)")
                .required(true)
                .multiple(true),
        )
        .get_matches();

    // A file that fails is reported and skipped; the exit status stays 0
    // either way.
    for base in matches.values_of("INPUT").unwrap() {
        if let Err(err) = assemble_file(base) {
            eprint!("{}", err);
        }
    }
}

fn assemble_file(base: &str) -> Result<(), Error> {
    let as_name = format!("{}.as", base);
    let am_name = format!("{}.am", base);

    let source = read_input(&as_name)?;

    // The expanded source is written out even when a later phase fails.
    let (expanded, mut diagnostics) = iasm::expand(&as_name, &source);
    write_text(&am_name, &expanded)?;

    match iasm::assemble(&am_name, &expanded) {
        Ok(assembly) if diagnostics.is_empty() => write_outputs(base, &assembly)?,
        Ok(_) => {}
        Err(more) => diagnostics.extend(more),
    }

    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic);
    }
    Ok(())
}

fn read_input(name: &str) -> Result<String, Error> {
    let path = PathBuf::from(name);
    let file =
        File::open(&path).map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.clone()))?;
    let mut buf_reader = BufReader::new(file);
    let mut input = String::new();

    buf_reader
        .read_to_string(&mut input)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path))?;
    Ok(input)
}

fn write_text(name: &str, text: &str) -> Result<(), Error> {
    let path = PathBuf::from(name);
    let write = |path: &PathBuf| -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(text.as_bytes())?;
        writer.flush()
    };

    write(&path).map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, path))
}

fn write_outputs(base: &str, assembly: &iasm::Assembly) -> Result<(), Error> {
    let ob_path = PathBuf::from(format!("{}.ob", base));
    obfile::write_object_file(&ob_path, &assembly.object)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, ob_path))?;

    let ext_path = PathBuf::from(format!("{}.ext", base));
    obfile::write_refs_file(&ext_path, &assembly.externals)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, ext_path))?;

    let ent_path = PathBuf::from(format!("{}.ent", base));
    obfile::write_refs_file(&ent_path, &assembly.entries)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, ent_path))?;
    Ok(())
}
