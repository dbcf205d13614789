#![no_main]

use bbst::model::CursorWorkload;
use bbst::Wavl;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorWorkload| {
    bbst::model::run_cursor_removal(Wavl, input.keys, input.removals);
});
