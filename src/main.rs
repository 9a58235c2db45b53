// Host demo: synthetic rPPG source driven through the frame pacer at 30 fps.
// Prints one status line per second of signal.

use core::f32::consts::PI;
use core::fmt::Write;

use embassy_futures::block_on;
use heapless::String;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use rppg_heartrate::{
    AcquisitionError, Batch, Cancellation, ControlMap, FramePacer, HeartRateEngine,
    HeartRateEstimate, PacerConfig, SampleSource,
};

//
// Debug configuration
//

// Print every estimate rather than once per second
const DUMP_MODE: bool = false;
const PULSE_HZ: f32 = 1.2; // 72 BPM
const AMPLITUDE: f32 = 8.0;
const NOISE: f32 = 1.5;
const SESSION_FRAMES: u32 = 450; // 15 s

// One sample per frame: a sinusoid with a slow illumination drift and noise
struct SyntheticSource {
    n: usize,
    rng: SmallRng,
}

impl SampleSource for SyntheticSource {
    fn poll_batch(&mut self, batch: &mut Batch) -> Result<(), AcquisitionError> {
        let t = self.n as f32 / 30.0;
        let pulse = AMPLITUDE * libm::sinf(2.0 * PI * PULSE_HZ * t);
        let drift = 3.0 * libm::sinf(2.0 * PI * 0.05 * t);
        let noise = self.rng.gen_range(-NOISE..NOISE);
        let _ = batch.push(pulse + drift + noise);
        self.n += 1;
        Ok(())
    }
}

// Host logger for the library's `log` output; RUST_LOG overrides the
// default `info` level.
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

// One line per second of signal, or every estimate in DUMP_MODE
fn reports(count: u32) -> bool {
    DUMP_MODE || count % 30 == 0
}

fn main() {
    init_logging();
    let mut engine = HeartRateEngine::new();
    let mut source = SyntheticSource { n: 0, rng: SmallRng::seed_from_u64(0x5eed) };
    let control = ControlMap::default();
    let cancel = Cancellation::new();
    let pacer = FramePacer::new(PacerConfig { max_frames: Some(SESSION_FRAMES), ..PacerConfig::default() });

    let mut msg: String<96> = String::new();
    let mut count = 0u32;
    let mut sink = |e: &HeartRateEstimate| {
        count += 1;
        if reports(count) {
            msg.clear();
            let _ = writeln!(
                msg,
                "{:>4} bpm={} conf={:.2} trend={:?} src={:?} volume={:.2}",
                count,
                e.bpm,
                e.confidence,
                e.trend,
                e.source,
                control.map(e.bpm)
            );
            print!("{}", msg);
        }
    };

    println!("Boot");
    match block_on(pacer.run(&mut engine, &mut source, &mut sink, &cancel)) {
        Ok(s) => {
            let c = s.cadence;
            println!(
                "Done: frames={} estimates={} skipped={} overruns={} interval(us) {:.0}/{:.0}/{:.0} {:.1}",
                s.frames,
                s.estimates,
                s.skipped,
                s.overruns,
                c.min(),
                c.mean(),
                c.max(),
                c.std()
            );
        }
        Err(e) => {
            eprintln!("session failed: {}", e);
            std::process::exit(1);
        }
    }
}
