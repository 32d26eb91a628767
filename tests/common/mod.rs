//! In-process stand-in for libvship.
//!
//! `FakeVship` implements the array-based `Backend` contract on the CPU for
//! 8-bit input. Scores are simple functions of the absolute sample difference,
//! which is enough to tell whether the right bytes reached the library. Every
//! compute call is logged with the pointers and strides it received.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::{CStr, c_char, c_int};
use std::sync::Mutex;

use vship_flat::Backend;
use vship_flat::ffi::{self, ExceptionCode};

/// Display models the fake knows without a configuration.
pub const BUILTIN_MODELS: [&str; 4] = ["standard_4k", "standard_fhd", "standard_hdr", "standard_hdr_dark"];

const UINT8: c_int = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    width: usize,
    height: usize,
    subw: u32,
    subh: u32,
    rgb: bool,
}

impl Geometry {
    fn from_raw(cs: &ffi::Colorspace) -> Self {
        Self {
            width: cs.width.max(0) as usize,
            height: cs.height.max(0) as usize,
            subw: cs.subsampling.subw.clamp(0, 16) as u32,
            subh: cs.subsampling.subh.clamp(0, 16) as u32,
            rgb: cs.color_family == 1,
        }
    }

    fn plane(&self, index: usize) -> (usize, usize) {
        if index == 0 || self.rgb {
            (self.width, self.height)
        } else {
            (self.width.div_ceil(1 << self.subw), self.height.div_ceil(1 << self.subh))
        }
    }
}

/// One compute or load call as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub handler: c_int,
    pub src: [usize; 3],
    pub dis: [usize; 3],
    pub src_line: [i64; 3],
    pub dis_line: [i64; 3],
    pub dst: usize,
    pub dst_stride: i64,
}

#[derive(Debug)]
struct CvvdpState {
    geometry: Geometry,
    history: Vec<f64>,
    accumulated: f64,
    frames: u32,
    model_key: String,
    config: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    next_id: c_int,
    ssimu2: HashMap<c_int, Geometry>,
    butteraugli: HashMap<c_int, (Geometry, c_int)>,
    cvvdp: HashMap<c_int, CvvdpState>,
    calls: Vec<Call>,
    fail_next: Option<ExceptionCode>,
    fail_free: bool,
    device: c_int,
}

impl State {
    fn allocate(&mut self) -> c_int {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug)]
pub struct FakeVship {
    state: Mutex<State>,
    devices: c_int,
}

impl Default for FakeVship {
    fn default() -> Self {
        Self::with_devices(1)
    }
}

impl FakeVship {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: c_int) -> Self {
        Self {
            state: Mutex::new(State::default()),
            devices,
        }
    }

    /// Make the next compute or load call return `code` without running.
    pub fn fail_next(&self, code: ExceptionCode) {
        self.state.lock().unwrap().fail_next = Some(code);
    }

    /// Make every free report `BadHandler` after removing the handler.
    pub fn fail_frees(&self) {
        self.state.lock().unwrap().fail_free = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls().pop().expect("no calls recorded")
    }

    pub fn live_handlers(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.ssimu2.len() + state.butteraugli.len() + state.cvvdp.len()
    }

    pub fn current_device(&self) -> c_int {
        self.state.lock().unwrap().device
    }

    pub fn butteraugli_qnorm(&self, id: c_int) -> Option<c_int> {
        self.state.lock().unwrap().butteraugli.get(&id).map(|(_, qnorm)| *qnorm)
    }

    pub fn cvvdp_model(&self, id: c_int) -> Option<(String, Option<String>)> {
        let state = self.state.lock().unwrap();
        state.cvvdp.get(&id).map(|cvvdp| (cvvdp.model_key.clone(), cvvdp.config.clone()))
    }

    pub fn message_for(code: ExceptionCode) -> String {
        match code.name() {
            Some(name) => format!("{name}: reported by fake vship"),
            None => format!("unknown status {}", code.raw()),
        }
    }

    fn take_failure(&self) -> Option<ExceptionCode> {
        self.state.lock().unwrap().fail_next.take()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

/// Read the three planes behind a plane array. Absent chroma planes are
/// `None`; a null plane 0 is an error.
unsafe fn read_image(
    geometry: &Geometry,
    planes: *const *const u8,
    lines: *const i64,
) -> Result<[Option<Vec<u8>>; 3], ExceptionCode> {
    if planes.is_null() || lines.is_null() {
        return Err(ExceptionCode::BAD_POINTER);
    }
    let planes = unsafe { std::slice::from_raw_parts(planes, 3) };
    let lines = unsafe { std::slice::from_raw_parts(lines, 3) };
    if planes[0].is_null() {
        return Err(ExceptionCode::BAD_POINTER);
    }

    let mut out: [Option<Vec<u8>>; 3] = [None, None, None];
    for (index, slot) in out.iter_mut().enumerate() {
        if planes[index].is_null() {
            continue;
        }
        let (width, height) = geometry.plane(index);
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = unsafe { planes[index].offset((y as i64 * lines[index]) as isize) };
            samples.extend_from_slice(unsafe { std::slice::from_raw_parts(row, width) });
        }
        *slot = Some(samples);
    }
    Ok(out)
}

type Image = [Option<Vec<u8>>; 3];

unsafe fn read_pair(
    geometry: &Geometry,
    src: *const *const u8,
    dis: *const *const u8,
    src_line: *const i64,
    dis_line: *const i64,
) -> Result<(Image, Image), ExceptionCode> {
    let src = unsafe { read_image(geometry, src, src_line)? };
    let dis = unsafe { read_image(geometry, dis, dis_line)? };
    Ok((src, dis))
}

/// Absolute differences of every plane present on both sides.
fn differences(src: &[Option<Vec<u8>>; 3], dis: &[Option<Vec<u8>>; 3]) -> Vec<f64> {
    src.iter()
        .zip(dis)
        .filter_map(|(a, b)| a.as_ref().zip(b.as_ref()))
        .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| f64::from(x.abs_diff(*y))))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn luma_differences(src: &[Option<Vec<u8>>; 3], dis: &[Option<Vec<u8>>; 3]) -> Vec<f64> {
    match (&src[0], &dis[0]) {
        (Some(a), Some(b)) => a.iter().zip(b).map(|(x, y)| f64::from(x.abs_diff(*y))).collect(),
        _ => Vec::new(),
    }
}

/// Write one value per luma sample into a row-strided `f32` map.
unsafe fn write_map(dstp: *const u8, stride: i64, geometry: &Geometry, values: &[f64]) {
    if dstp.is_null() {
        return;
    }
    let (width, height) = geometry.plane(0);
    for y in 0..height {
        for x in 0..width {
            let offset = y as i64 * stride + (x * 4) as i64;
            let target = unsafe { dstp.cast_mut().offset(offset as isize).cast::<f32>() };
            unsafe { target.write_unaligned(values[y * width + x] as f32) };
        }
    }
}

fn pointers(planes: *const *const u8) -> [usize; 3] {
    if planes.is_null() {
        return [0; 3];
    }
    let planes = unsafe { std::slice::from_raw_parts(planes, 3) };
    [planes[0] as usize, planes[1] as usize, planes[2] as usize]
}

fn strides(lines: *const i64) -> [i64; 3] {
    if lines.is_null() {
        return [0; 3];
    }
    let lines = unsafe { std::slice::from_raw_parts(lines, 3) };
    [lines[0], lines[1], lines[2]]
}

fn check_pair(src: &ffi::Colorspace, dis: &ffi::Colorspace) -> ExceptionCode {
    if src.sample != dis.sample {
        ExceptionCode::DIFFERING_INPUT_TYPE
    } else if src.sample != UINT8 {
        ExceptionCode::NON_RGBS_INPUT
    } else {
        ExceptionCode::NO_ERROR
    }
}

impl Backend for FakeVship {
    fn version(&self) -> ffi::Version {
        ffi::Version {
            major: 4,
            minor: 1,
            minor_minor: 0,
            backend: 1,
        }
    }

    unsafe fn device_count(&self, count: *mut c_int) -> ExceptionCode {
        if self.devices == 0 {
            return ExceptionCode::NO_DEVICE_DETECTED;
        }
        unsafe { count.write(self.devices) };
        ExceptionCode::NO_ERROR
    }

    fn gpu_full_check(&self, gpu_id: c_int) -> ExceptionCode {
        if (0..self.devices).contains(&gpu_id) {
            ExceptionCode::NO_ERROR
        } else {
            ExceptionCode::BAD_DEVICE_ARGUMENT
        }
    }

    fn set_device(&self, gpu_id: c_int) -> ExceptionCode {
        if !(0..self.devices).contains(&gpu_id) {
            return ExceptionCode::BAD_DEVICE_ARGUMENT;
        }
        self.state.lock().unwrap().device = gpu_id;
        ExceptionCode::NO_ERROR
    }

    unsafe fn device_info(&self, info: *mut ffi::DeviceInfo, gpu_id: c_int) -> ExceptionCode {
        if !(0..self.devices).contains(&gpu_id) {
            return ExceptionCode::BAD_DEVICE_ARGUMENT;
        }
        let mut raw = ffi::DeviceInfo::default();
        let name = format!("Fake GPU {gpu_id}");
        for (slot, byte) in raw.name.iter_mut().zip(name.bytes()) {
            *slot = byte as c_char;
        }
        raw.vram_size = 8 * 1024 * 1024 * 1024;
        raw.integrated = 0;
        raw.multi_processor_count = 32;
        raw.warp_size = 32;
        unsafe { info.write(raw) };
        ExceptionCode::NO_ERROR
    }

    unsafe fn error_message(&self, code: ExceptionCode, out: *mut c_char, len: c_int) -> c_int {
        let message = Self::message_for(code);
        let needed = message.len() + 1;
        if !out.is_null() && len > 0 {
            let count = message.len().min(len as usize - 1);
            for (i, byte) in message.bytes().take(count).enumerate() {
                unsafe { out.add(i).write(byte as c_char) };
            }
            unsafe { out.add(count).write(0) };
        }
        needed as c_int
    }

    unsafe fn ssimu2_init(
        &self,
        handler: *mut ffi::Ssimu2Handler,
        src: ffi::Colorspace,
        dis: ffi::Colorspace,
    ) -> ExceptionCode {
        let code = check_pair(&src, &dis);
        if !code.is_none() {
            return code;
        }
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.ssimu2.insert(id, Geometry::from_raw(&src));
        unsafe { handler.write(ffi::Ssimu2Handler { id }) };
        ExceptionCode::NO_ERROR
    }

    fn ssimu2_free(&self, handler: ffi::Ssimu2Handler) -> ExceptionCode {
        let mut state = self.state.lock().unwrap();
        if state.ssimu2.remove(&handler.id).is_none() || state.fail_free {
            return ExceptionCode::BAD_HANDLER;
        }
        ExceptionCode::NO_ERROR
    }

    unsafe fn compute_ssimu2(
        &self,
        handler: ffi::Ssimu2Handler,
        score: *mut f64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        self.record(Call {
            op: "ssimu2",
            handler: handler.id,
            src: pointers(src),
            dis: pointers(dis),
            src_line: strides(src_line),
            dis_line: strides(dis_line),
            dst: 0,
            dst_stride: 0,
        });
        if let Some(code) = self.take_failure() {
            return code;
        }
        let Some(geometry) = self.state.lock().unwrap().ssimu2.get(&handler.id).copied() else {
            return ExceptionCode::BAD_HANDLER;
        };
        let images = unsafe { read_pair(&geometry, src, dis, src_line, dis_line) };
        let (src, dis) = match images {
            Ok(images) => images,
            Err(code) => return code,
        };
        let mad = mean(&differences(&src, &dis));
        unsafe { score.write(100.0 * (1.0 - mad / 255.0)) };
        ExceptionCode::NO_ERROR
    }

    unsafe fn butteraugli_init(
        &self,
        handler: *mut ffi::ButteraugliHandler,
        src: ffi::Colorspace,
        dis: ffi::Colorspace,
        qnorm: c_int,
        _display_nits: f32,
    ) -> ExceptionCode {
        let code = check_pair(&src, &dis);
        if !code.is_none() {
            return code;
        }
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.butteraugli.insert(id, (Geometry::from_raw(&src), qnorm));
        unsafe { handler.write(ffi::ButteraugliHandler { id }) };
        ExceptionCode::NO_ERROR
    }

    fn butteraugli_free(&self, handler: ffi::ButteraugliHandler) -> ExceptionCode {
        let mut state = self.state.lock().unwrap();
        if state.butteraugli.remove(&handler.id).is_none() || state.fail_free {
            return ExceptionCode::BAD_HANDLER;
        }
        ExceptionCode::NO_ERROR
    }

    unsafe fn compute_butteraugli(
        &self,
        handler: ffi::ButteraugliHandler,
        score: *mut ffi::ButteraugliScore,
        dstp: *const u8,
        dst_stride: i64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        self.record(Call {
            op: "butteraugli",
            handler: handler.id,
            src: pointers(src),
            dis: pointers(dis),
            src_line: strides(src_line),
            dis_line: strides(dis_line),
            dst: dstp as usize,
            dst_stride,
        });
        if let Some(code) = self.take_failure() {
            return code;
        }
        let Some((geometry, qnorm)) = self.state.lock().unwrap().butteraugli.get(&handler.id).copied()
        else {
            return ExceptionCode::BAD_HANDLER;
        };
        let images = unsafe { read_pair(&geometry, src, dis, src_line, dis_line) };
        let (src, dis) = match images {
            Ok(images) => images,
            Err(code) => return code,
        };

        let distances: Vec<f64> = luma_differences(&src, &dis).iter().map(|d| d / 25.5).collect();
        let norm = |q: f64| mean(&distances.iter().map(|d| d.powf(q)).collect::<Vec<_>>()).powf(1.0 / q);
        let result = ffi::ButteraugliScore {
            norm_q: norm(f64::from(qnorm.max(1))),
            norm3: norm(3.0),
            norm_inf: distances.iter().copied().fold(0.0, f64::max),
        };
        unsafe {
            write_map(dstp, dst_stride, &geometry, &distances);
            score.write(result);
        }
        ExceptionCode::NO_ERROR
    }

    unsafe fn cvvdp_init(
        &self,
        handler: *mut ffi::CvvdpHandler,
        src: ffi::Colorspace,
        dis: ffi::Colorspace,
        fps: f32,
        resize_to_display: bool,
        model_key: *const c_char,
    ) -> ExceptionCode {
        unsafe {
            self.cvvdp_init_with_config(handler, src, dis, fps, resize_to_display, model_key, std::ptr::null())
        }
    }

    unsafe fn cvvdp_init_with_config(
        &self,
        handler: *mut ffi::CvvdpHandler,
        src: ffi::Colorspace,
        dis: ffi::Colorspace,
        _fps: f32,
        _resize_to_display: bool,
        model_key: *const c_char,
        model_config_path: *const c_char,
    ) -> ExceptionCode {
        let code = check_pair(&src, &dis);
        if !code.is_none() {
            return code;
        }
        if model_key.is_null() {
            return ExceptionCode::BAD_POINTER;
        }
        let key = unsafe { CStr::from_ptr(model_key) }.to_string_lossy().into_owned();
        let config = if model_config_path.is_null() {
            None
        } else {
            let path = unsafe { CStr::from_ptr(model_config_path) }.to_string_lossy().into_owned();
            let Ok(text) = std::fs::read_to_string(&path) else {
                return ExceptionCode::BAD_PATH;
            };
            Some(text)
        };

        let mut known = BUILTIN_MODELS.contains(&key.as_str());
        if let Some(config) = &config {
            let Ok(serde_json::Value::Object(models)) = serde_json::from_str::<serde_json::Value>(config) else {
                return ExceptionCode::BAD_JSON;
            };
            known |= models.contains_key(&key);
        }
        if !known {
            return ExceptionCode::BAD_DISPLAY_MODEL;
        }

        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.cvvdp.insert(
            id,
            CvvdpState {
                geometry: Geometry::from_raw(&src),
                history: Vec::new(),
                accumulated: 0.0,
                frames: 0,
                model_key: key,
                config,
            },
        );
        unsafe { handler.write(ffi::CvvdpHandler { id }) };
        ExceptionCode::NO_ERROR
    }

    fn cvvdp_free(&self, handler: ffi::CvvdpHandler) -> ExceptionCode {
        let mut state = self.state.lock().unwrap();
        if state.cvvdp.remove(&handler.id).is_none() || state.fail_free {
            return ExceptionCode::BAD_HANDLER;
        }
        ExceptionCode::NO_ERROR
    }

    fn cvvdp_reset(&self, handler: ffi::CvvdpHandler) -> ExceptionCode {
        let mut state = self.state.lock().unwrap();
        let Some(cvvdp) = state.cvvdp.get_mut(&handler.id) else {
            return ExceptionCode::BAD_HANDLER;
        };
        cvvdp.history.clear();
        cvvdp.accumulated = 0.0;
        cvvdp.frames = 0;
        ExceptionCode::NO_ERROR
    }

    fn cvvdp_reset_score(&self, handler: ffi::CvvdpHandler) -> ExceptionCode {
        let mut state = self.state.lock().unwrap();
        let Some(cvvdp) = state.cvvdp.get_mut(&handler.id) else {
            return ExceptionCode::BAD_HANDLER;
        };
        cvvdp.accumulated = 0.0;
        cvvdp.frames = 0;
        ExceptionCode::NO_ERROR
    }

    unsafe fn load_temporal_cvvdp(
        &self,
        handler: ffi::CvvdpHandler,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        self.record(Call {
            op: "load_temporal_cvvdp",
            handler: handler.id,
            src: pointers(src),
            dis: pointers(dis),
            src_line: strides(src_line),
            dis_line: strides(dis_line),
            dst: 0,
            dst_stride: 0,
        });
        if let Some(code) = self.take_failure() {
            return code;
        }
        let mut state = self.state.lock().unwrap();
        let Some(cvvdp) = state.cvvdp.get_mut(&handler.id) else {
            return ExceptionCode::BAD_HANDLER;
        };
        let geometry = cvvdp.geometry;
        let images = unsafe { read_pair(&geometry, src, dis, src_line, dis_line) };
        match images {
            Ok((src, dis)) => {
                cvvdp.history.push(mean(&differences(&src, &dis)) / 255.0);
                ExceptionCode::NO_ERROR
            }
            Err(code) => code,
        }
    }

    unsafe fn compute_cvvdp(
        &self,
        handler: ffi::CvvdpHandler,
        score: *mut f64,
        dstp: *const u8,
        dst_stride: i64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        self.record(Call {
            op: "cvvdp",
            handler: handler.id,
            src: pointers(src),
            dis: pointers(dis),
            src_line: strides(src_line),
            dis_line: strides(dis_line),
            dst: dstp as usize,
            dst_stride,
        });
        if let Some(code) = self.take_failure() {
            return code;
        }
        let mut state = self.state.lock().unwrap();
        let Some(cvvdp) = state.cvvdp.get_mut(&handler.id) else {
            return ExceptionCode::BAD_HANDLER;
        };
        let geometry = cvvdp.geometry;
        let images = unsafe { read_pair(&geometry, src, dis, src_line, dis_line) };
        let (src, dis) = match images {
            Ok(images) => images,
            Err(code) => return code,
        };

        cvvdp.history.push(mean(&differences(&src, &dis)) / 255.0);
        // Later frames weigh more, so the order of the history matters.
        let (weighted, weights) = cvvdp
            .history
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sum, total), (i, d)| (sum + d * (i + 1) as f64, total + (i + 1) as f64));
        cvvdp.accumulated += weighted / weights;
        cvvdp.frames += 1;
        let jod = 10.0 - 10.0 * cvvdp.accumulated / f64::from(cvvdp.frames);

        let map: Vec<f64> = luma_differences(&src, &dis).iter().map(|d| d / 255.0).collect();
        unsafe {
            write_map(dstp, dst_stride, &geometry, &map);
            score.write(jod);
        }
        ExceptionCode::NO_ERROR
    }
}

/// An 8-bit planar frame with padded rows.
#[derive(Debug, Clone)]
pub struct Frame {
    pub planes: [Vec<u8>; 3],
    pub strides: [usize; 3],
}

impl Frame {
    /// 4:2:0 frame; each sample is `fill(plane, x, y)`. Rows are padded by
    /// `padding` bytes.
    pub fn yuv420(width: usize, height: usize, padding: usize, fill: impl Fn(usize, usize, usize) -> u8) -> Self {
        let dims = [
            (width, height),
            (width.div_ceil(2), height.div_ceil(2)),
            (width.div_ceil(2), height.div_ceil(2)),
        ];
        let mut planes: [Vec<u8>; 3] = Default::default();
        let mut strides = [0; 3];
        for (index, (w, h)) in dims.into_iter().enumerate() {
            let stride = w + padding;
            let mut data = vec![0xEE; stride * h];
            for y in 0..h {
                for x in 0..w {
                    data[y * stride + x] = fill(index, x, y);
                }
            }
            planes[index] = data;
            strides[index] = stride;
        }
        Self { planes, strides }
    }

    /// Same value in every sample.
    pub fn flat(width: usize, height: usize, value: u8) -> Self {
        Self::yuv420(width, height, 0, |_, _, _| value)
    }

    pub fn views(&self) -> vship_flat::Planes<'_> {
        vship_flat::Planes::new(
            vship_flat::Plane::new(&self.planes[0], self.strides[0]),
            vship_flat::Plane::new(&self.planes[1], self.strides[1]),
            vship_flat::Plane::new(&self.planes[2], self.strides[2]),
        )
    }

    pub fn ptrs(&self) -> [*const u8; 3] {
        [self.planes[0].as_ptr(), self.planes[1].as_ptr(), self.planes[2].as_ptr()]
    }

    pub fn lines(&self) -> [i64; 3] {
        self.strides.map(|s| s as i64)
    }

    pub fn addresses(&self) -> [usize; 3] {
        self.ptrs().map(|p| p as usize)
    }
}
