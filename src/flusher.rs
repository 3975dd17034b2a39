// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The background thread that periodically drains every buffer pair.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossbeam_channel::bounded;
use crossbeam_channel::select;
use crossbeam_channel::tick;

use crate::Error;
use crate::logger::Pipeline;

const THREAD_NAME: &str = "batchlog-flusher";

/// Owns the flusher thread. Stopping or dropping the guard drains once more and joins it.
#[derive(Debug)]
pub(crate) struct FlusherGuard {
    handle: Option<JoinHandle<()>>,
    shutdown: Sender<()>,
}

impl FlusherGuard {
    pub(crate) fn spawn(pipeline: Arc<Pipeline>, interval: Duration) -> Result<Self, Error> {
        let (shutdown, shutdown_receiver) = bounded::<()>(1);
        let ticker = tick(interval);

        let handle = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> _ => pipeline.flush(),
                        recv(shutdown_receiver) -> _ => break,
                    }
                }
                pipeline.flush();
            })
            .map_err(|err| {
                Error::new("failed to spawn the background flusher thread").with_source(err)
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    pub(crate) fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.shutdown.send(());
        if handle.join().is_err() {
            eprintln!("{THREAD_NAME} thread panicked");
        }
    }
}

impl Drop for FlusherGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;
    use crate::RecordFormat;
    use crate::TimeFormat;
    use crate::buffer::BufferPool;
    use crate::buffer::Selector;
    use crate::sink::Controller;
    use crate::sink::Sink;
    use crate::trap::DefaultTrap;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn pipeline(out: &Shared) -> Arc<Pipeline> {
        let controller = Controller::new(
            Sink::writer(out.clone(), false, false),
            u64::MAX,
            TimeFormat::Unix,
            DefaultTrap::default(),
        );
        let pool = BufferPool::new(2, 1024, 1 << 20, Selector::RoundRobin);
        Arc::new(Pipeline::new(pool, controller, RecordFormat::default()))
    }

    #[test]
    fn test_ticker_flushes_buffered_records() {
        let out = Shared::default();
        let pipeline = pipeline(&out);
        pipeline.pool.pairs()[0].sync.write(b"a\n");
        pipeline.pool.pairs()[1].sync.write(b"b\n");

        let _guard = FlusherGuard::spawn(pipeline.clone(), Duration::from_millis(10)).unwrap();
        let mut waited = 0;
        while out.0.lock().unwrap().len() < 4 && waited < 200 {
            std::thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
        assert_eq!(&*out.0.lock().unwrap(), b"a\nb\n");
    }

    #[test]
    fn test_stop_drains_and_joins() {
        let out = Shared::default();
        let pipeline = pipeline(&out);
        let mut guard = FlusherGuard::spawn(pipeline.clone(), Duration::from_secs(3600)).unwrap();
        pipeline.pool.pairs()[0].sync.write(b"late\n");
        guard.stop();
        assert_eq!(&*out.0.lock().unwrap(), b"late\n");
        guard.stop();
    }
}
