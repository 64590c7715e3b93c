use crate::record::Record;
use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub enum Writer<W: Write> {
    Pretty(W),
    Debug(W),
    Json(W, bool), // bool tracks if we've written the opening bracket
    Jsonl(W),
}

impl<W: Write> Writer<W> {
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        match self {
            Writer::Pretty(writer) => {
                serde_json::to_writer_pretty(&mut *writer, record)?;
                writeln!(writer)?;
            }
            Writer::Debug(writer) => {
                writeln!(writer, "{:#?}", record)?;
            }
            Writer::Json(writer, is_first) => {
                if *is_first {
                    write!(writer, "[")?;
                    *is_first = false;
                } else {
                    write!(writer, ",")?;
                }
                let serialized = serde_json::to_string_pretty(record)?;
                write!(writer, "\n{}", serialized)?;
            }
            Writer::Jsonl(writer) => {
                serde_json::to_writer(&mut *writer, record)?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    /// Close the array for JSON output and flush. Returns the inner sink.
    pub fn finish(self) -> Result<W> {
        let mut writer = match self {
            Writer::Json(mut writer, is_first) => {
                if is_first {
                    write!(writer, "[")?;
                }
                writeln!(writer, "\n]")?;
                writer
            }
            Writer::Pretty(writer) | Writer::Debug(writer) | Writer::Jsonl(writer) => writer,
        };
        writer.flush()?;
        Ok(writer)
    }
}

pub fn create_writer(output_arg: &str) -> Result<Writer<Box<dyn Write>>> {
    let stdout = || -> Box<dyn Write> { Box::new(BufWriter::new(io::stdout().lock())) };
    match output_arg {
        "stdout" => Ok(Writer::Pretty(stdout())),
        "debug" => Ok(Writer::Debug(stdout())),
        "jsonl" => Ok(Writer::Jsonl(stdout())),
        path if path.ends_with(".json") => Ok(Writer::Json(create_file(path)?, true)),
        path if path.ends_with(".jsonl") || path.ends_with(".ndjson") => {
            Ok(Writer::Jsonl(create_file(path)?))
        }
        _ => Err(anyhow!(
            "Unknown output target: {}. Use 'stdout', 'debug', 'jsonl', or a .json/.jsonl/.ndjson path",
            output_arg
        )),
    }
}

fn create_file(path: &str) -> Result<Box<dyn Write>> {
    create_parent_dirs(path)?;
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

fn create_parent_dirs(file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::parse_record;
    use serde_json::{json, Value};

    fn records() -> Vec<Record> {
        [
            "{\"Cmdline\":\"ls\\u0000-la\\u0000\",\"When\":\"2023-05-01T12:30:00.123456Z000\"}",
            r#"{"Foo":"bar"}"#,
        ]
        .iter()
        .map(|line| parse_record(line).unwrap().unwrap())
        .collect()
    }

    fn render(mut writer: Writer<Vec<u8>>, records: &[Record]) -> String {
        for record in records {
            writer.write_record(record).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn jsonl_one_object_per_line() {
        let out = render(Writer::Jsonl(Vec::new()), &records());
        let lines: Vec<Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(
            lines,
            vec![
                json!({"Cmdline": ["ls", "-la"], "When": "2023-05-01T12:30:00.123456"}),
                json!({"Foo": "bar"}),
            ]
        );
    }

    #[test]
    fn json_array_is_valid() {
        let out = render(Writer::Json(Vec::new(), true), &records());
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert_eq!(parsed[1], json!({"Foo": "bar"}));
    }

    #[test]
    fn json_array_empty_input() {
        let out = render(Writer::Json(Vec::new(), true), &[]);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!([]));
    }

    #[test]
    fn pretty_output_parses_back() {
        let out = render(Writer::Pretty(Vec::new()), &records()[1..]);
        assert!(out.contains("\"Foo\": \"bar\""));
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"Foo": "bar"}));
    }

    #[test]
    fn debug_output_names_fields() {
        let out = render(Writer::Debug(Vec::new()), &records()[..1]);
        assert!(out.contains("cmdline"));
        assert!(out.contains("\"-la\""));
    }

    #[test]
    fn writes_jsonl_file_under_new_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/records.jsonl");
        let mut writer = create_writer(path.to_str().unwrap()).unwrap();
        for record in &records() {
            writer.write_record(record).unwrap();
        }
        writer.finish().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(create_writer("records.csv").is_err());
    }
}
