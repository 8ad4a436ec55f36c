//! 运动服务线程
//!
//! 把 [`BinController`] 移到专用工作线程，外部通过 [`MotionHandle`] 发送命令。
//! 工作线程串行处理所有请求：
//!
//! - 序列执行期间，用命令通道的 `recv_deadline` 作为步进定时器，每个 `step_delay` tick 一次
//! - 两次 tick 之间可以接收 `Cancel`，其他请求一律回复 [`MotionError::Busy`]
//! - 满桶锁存不经过服务暴露，调用方用 `is_full()` 自行决定

use crate::controller::BinController;
use crate::error::MotionError;
use crate::state::Tick;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use smartbin_hal::{ChannelArray, ChannelId, Indicator, RangeSensor, ServoBank};
use std::thread::{JoinHandle, spawn};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// 命令队列容量
const COMMAND_QUEUE_CAPACITY: usize = 10;

/// 关闭时等待工作线程退出的时长
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

type Reply<T> = Sender<Result<T, MotionError>>;

enum Request {
    Open { channel: ChannelId, reply: Reply<()> },
    CloseAll { reply: Reply<()> },
    Reset { reply: Reply<()> },
    Distance { reply: Reply<f64> },
    IsFull { reply: Reply<bool> },
    Calibrate {
        channel: ChannelId,
        value: f64,
        reply: Reply<()>,
    },
    Angles { reply: Reply<ChannelArray<i32>> },
    Cancel,
    Shutdown,
}

impl Request {
    /// 序列执行期间收到的请求
    fn reject_busy(self) {
        // 发送失败说明调用方已放弃等待
        match self {
            Request::Open { reply, .. }
            | Request::CloseAll { reply }
            | Request::Reset { reply }
            | Request::Calibrate { reply, .. } => {
                let _ = reply.send(Err(MotionError::Busy));
            },
            Request::Distance { reply } => {
                let _ = reply.send(Err(MotionError::Busy));
            },
            Request::IsFull { reply } => {
                let _ = reply.send(Err(MotionError::Busy));
            },
            Request::Angles { reply } => {
                let _ = reply.send(Err(MotionError::Busy));
            },
            Request::Cancel | Request::Shutdown => {},
        }
    }
}

/// 带超时的线程 join
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);

        // 看守线程代为 join；超时后它继续挂着，进程退出时回收
        spawn(move || {
            let _ = tx.send(self.join());
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result.map(|_| ()),
            Err(RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "worker join timeout",
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "watchdog exited without result",
            ))),
        }
    }
}

/// 运动服务
///
/// 持有工作线程。Drop 时通知线程退出并带超时地等待。
pub struct MotionService {
    handle: MotionHandle,
    worker: Option<JoinHandle<()>>,
}

impl MotionService {
    /// 启动工作线程
    pub fn spawn<S, R, I>(controller: BinController<S, R, I>) -> Self
    where
        S: ServoBank + Send + 'static,
        R: RangeSensor + Send + 'static,
        I: Indicator + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(COMMAND_QUEUE_CAPACITY);
        let worker = spawn(move || run_worker(controller, rx));
        info!("motion service started");

        Self {
            handle: MotionHandle { tx },
            worker: Some(worker),
        }
    }

    /// 获取命令句柄
    pub fn handle(&self) -> MotionHandle {
        self.handle.clone()
    }

    /// 停止服务
    ///
    /// 执行中的序列被取消，等待方收到 [`MotionError::Cancelled`]。
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for MotionService {
    fn drop(&mut self) {
        // 队列满时阻塞等待；线程已退出则发送失败，直接 join
        let _ = self.handle.tx.send(Request::Shutdown);

        if let Some(worker) = self.worker.take()
            && let Err(_e) = worker.join_timeout(JOIN_TIMEOUT)
        {
            error!(
                "motion worker panicked or failed to shut down within {:?}",
                JOIN_TIMEOUT
            );
        }
    }
}

/// 运动服务命令句柄
///
/// 可克隆，可跨线程使用。除 `cancel` 外每个调用都阻塞到工作线程回复。
#[derive(Clone)]
pub struct MotionHandle {
    tx: Sender<Request>,
}

impl MotionHandle {
    /// 打开 `channel`，阻塞到序列结束
    pub fn open(&self, channel: ChannelId) -> Result<(), MotionError> {
        self.call(|reply| Request::Open { channel, reply })
    }

    /// 所有通道回到 0，阻塞到序列结束
    pub fn close_all(&self) -> Result<(), MotionError> {
        self.call(|reply| Request::CloseAll { reply })
    }

    /// 所有通道立即归零
    pub fn reset(&self) -> Result<(), MotionError> {
        self.call(|reply| Request::Reset { reply })
    }

    /// 读取一次距离
    pub fn distance(&self) -> Result<f64, MotionError> {
        self.call(|reply| Request::Distance { reply })
    }

    /// 判断是否满桶（不进入锁存）
    pub fn is_full(&self) -> Result<bool, MotionError> {
        self.call(|reply| Request::IsFull { reply })
    }

    /// 标定通道
    pub fn calibrate(&self, channel: ChannelId, value: f64) -> Result<(), MotionError> {
        self.call(|reply| Request::Calibrate {
            channel,
            value,
            reply,
        })
    }

    /// 所有通道的指令角度
    pub fn angles(&self) -> Result<ChannelArray<i32>, MotionError> {
        self.call(|reply| Request::Angles { reply })
    }

    /// 取消正在执行的序列（不等待）
    pub fn cancel(&self) -> Result<(), MotionError> {
        self.tx
            .send(Request::Cancel)
            .map_err(|_| MotionError::ServiceClosed)
    }

    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T, MotionError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.tx
            .send(make(reply_tx))
            .map_err(|_| MotionError::ServiceClosed)?;
        reply_rx.recv().map_err(|_| MotionError::ServiceClosed)?
    }
}

/// 正在执行的序列
struct Active {
    reply: Reply<()>,
    /// 下一次 tick 的时间
    next_tick: Instant,
}

fn run_worker<S, R, I>(mut controller: BinController<S, R, I>, rx: Receiver<Request>)
where
    S: ServoBank,
    R: RangeSensor,
    I: Indicator,
{
    let delay = controller.config().step_delay();
    let mut active: Option<Active> = None;

    loop {
        match active.take() {
            Some(seq) => match rx.recv_deadline(seq.next_tick) {
                Ok(Request::Cancel) => {
                    controller.cancel();
                    let _ = seq.reply.send(Err(MotionError::Cancelled));
                },
                Ok(Request::Shutdown) => {
                    controller.cancel();
                    let _ = seq.reply.send(Err(MotionError::Cancelled));
                    break;
                },
                Ok(other) => {
                    other.reject_busy();
                    active = Some(seq);
                },
                Err(RecvTimeoutError::Timeout) => {
                    active = advance(&mut controller, seq.reply, delay);
                },
                Err(RecvTimeoutError::Disconnected) => {
                    controller.cancel();
                    break;
                },
            },
            None => match rx.recv() {
                Ok(Request::Shutdown) | Err(_) => break,
                Ok(request) => {
                    if let Some(reply) = dispatch(&mut controller, request) {
                        active = advance(&mut controller, reply, delay);
                    }
                },
            },
        }
    }

    info!("motion worker exiting");
}

/// tick 一次；序列未结束时返回下一次 tick 的时间
fn advance<S, R, I>(
    controller: &mut BinController<S, R, I>,
    reply: Reply<()>,
    delay: Duration,
) -> Option<Active>
where
    S: ServoBank,
    R: RangeSensor,
    I: Indicator,
{
    match controller.tick() {
        Ok(Tick::Stepped) => Some(Active {
            reply,
            next_tick: Instant::now() + delay,
        }),
        Ok(Tick::Finished) => {
            let _ = reply.send(Ok(()));
            None
        },
        Err(e) => {
            let _ = reply.send(Err(e));
            None
        },
    }
}

/// 处理空闲时收到的请求；启动了序列时返回它的回复通道
fn dispatch<S, R, I>(
    controller: &mut BinController<S, R, I>,
    request: Request,
) -> Option<Reply<()>>
where
    S: ServoBank,
    R: RangeSensor,
    I: Indicator,
{
    match request {
        Request::Open { channel, reply } => match controller.begin_open(channel) {
            Ok(()) => Some(reply),
            Err(e) => {
                let _ = reply.send(Err(e));
                None
            },
        },
        Request::CloseAll { reply } => match controller.begin_close() {
            Ok(()) => Some(reply),
            Err(e) => {
                let _ = reply.send(Err(e));
                None
            },
        },
        Request::Reset { reply } => {
            let _ = reply.send(controller.reset());
            None
        },
        Request::Distance { reply } => {
            let _ = reply.send(controller.get_distance());
            None
        },
        Request::IsFull { reply } => {
            let _ = reply.send(controller.is_full());
            None
        },
        Request::Calibrate {
            channel,
            value,
            reply,
        } => {
            let _ = reply.send(controller.calibrate_channel(channel, value));
            None
        },
        Request::Angles { reply } => {
            let _ = reply.send(Ok(controller.commanded_angles()));
            None
        },
        Request::Cancel | Request::Shutdown => {
            debug!("no sequence running, nothing to cancel");
            None
        },
    }
}
