use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};
use strum::IntoEnumIterator;
use uvcam_types::{CameraOptions, Control};
use uvcam_usb::codec::DecodedValue;
use uvcam_usb::controls::{descriptor, lookup};
use uvcam_usb::handle::CameraHandle;

#[derive(Parser, Debug)]
#[command(about, version)]
struct Cli {
    /// USB vendor id of the camera (hex, e.g. 046d)
    #[arg(long, value_parser = parse_hex_id)]
    vendor_id: Option<u16>,

    /// USB product id of the camera (hex, e.g. 082d)
    #[arg(long, value_parser = parse_hex_id)]
    product_id: Option<u16>,

    /// Override the Input Terminal unit id (default 1)
    #[arg(long)]
    input_terminal_id: Option<u8>,

    /// Override the Processing Unit unit id (default 3)
    #[arg(long)]
    processing_unit_id: Option<u8>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List every recognized control
    List,
    /// Read the current value of a control
    Get { control: String },
    /// Read the min/max range of a control
    Range { control: String },
    /// Write a single-value control
    Set { control: String, value: i64 },
    /// Write raw bytes to a control (hex, e.g. e8030000 18fcffff)
    SetRaw { control: String, bytes: Vec<String> },
    /// Print the camera's descriptor data
    Describe,
    /// Read the value and range of every control
    Dump,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };
    CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])?;

    if let CliCommand::List = cli.command {
        print_controls();
        return Ok(());
    }

    let vid = cli
        .vendor_id
        .ok_or_else(|| anyhow!("--vendor-id is required for this command"))?;
    let pid = cli
        .product_id
        .ok_or_else(|| anyhow!("--product-id is required for this command"))?;
    let options = CameraOptions {
        input_terminal_id: cli.input_terminal_id,
        processing_unit_id: cli.processing_unit_id,
    };

    let camera = CameraHandle::open(vid, pid, options).await?;

    match cli.command {
        CliCommand::List => {}
        CliCommand::Get { control } => {
            let control = lookup(&control)?;
            println!("{}", format_value(&camera.get(control).await?));
        }
        CliCommand::Range { control } => {
            let control = lookup(&control)?;
            let (min, max) = camera.range(control).await?;
            println!("{} .. {}", format_value(&min), format_value(&max));
        }
        CliCommand::Set { control, value } => {
            let control = lookup(&control)?;
            camera.set(control, value).await?;
        }
        CliCommand::SetRaw { control, bytes } => {
            let control = lookup(&control)?;
            camera.set_raw(control, parse_hex_bytes(&bytes)?).await?;
        }
        CliCommand::Describe => {
            let data = camera.describe().await?;
            println!("Vendor ID:    {:#06x}", data.vendor_id());
            println!("Product ID:   {:#06x}", data.product_id());
            let (major, minor, sub) = data.device_version();
            println!("USB Version:  {major}.{minor}.{sub}");
            println!("Manufacturer: {}", data.device_manufacturer());
            println!("Product:      {}", data.product_name());
        }
        CliCommand::Dump => {
            for control in Control::iter() {
                match camera.get(control).await {
                    Ok(value) => {
                        let range = match camera.range(control).await {
                            Ok((min, max)) => {
                                format!("{} .. {}", format_value(&min), format_value(&max))
                            }
                            Err(error) => format!("range unavailable: {error}"),
                        };
                        println!("{control}: {} ({range})", format_value(&value));
                    }
                    Err(error) => println!("{control}: unavailable ({error})"),
                }
            }
        }
    }

    camera.close();
    Ok(())
}

fn print_controls() {
    for control in Control::iter() {
        let descriptor = descriptor(control);
        println!(
            "{:<26} unit={:<15} selector={:#04x} size={} field_size={}",
            control.to_string(),
            descriptor.unit.to_string(),
            descriptor.selector,
            descriptor.total_size,
            descriptor.field_size
        );
    }
}

fn format_value(value: &DecodedValue) -> String {
    match value {
        DecodedValue::Scalar(value) => value.to_string(),
        DecodedValue::Fields(fields) => fields
            .iter()
            .map(|field| field.to_string())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn parse_hex_id(value: &str) -> Result<u16, String> {
    let digits = value.trim_start_matches("0x");
    u16::from_str_radix(digits, 16).map_err(|error| error.to_string())
}

fn parse_hex_bytes(words: &[String]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for word in words {
        if !word.is_ascii() || word.len() % 2 != 0 {
            bail!("Hex payload {word} must be an even number of hex digits");
        }
        for i in (0..word.len()).step_by(2) {
            bytes.push(u8::from_str_radix(&word[i..i + 2], 16)?);
        }
    }
    Ok(bytes)
}
