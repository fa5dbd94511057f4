use aerosync_frame::{decode_frame, Frame};
use bytes::Bytes;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Exits non-zero when the frame is an engine error.
pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let data = std::fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    let frame = decode_frame(Bytes::from(data))
        .map_err(|err| frame_error(&format!("failed decoding {}", args.file.display()), err))?;

    print_frame(&frame, format);
    match frame {
        Frame::Mesh(_) => Ok(SUCCESS),
        Frame::Error(_) => Ok(FAILURE),
    }
}
