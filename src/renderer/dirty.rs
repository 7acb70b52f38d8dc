//! 脏标记传播
//!
//! 每个帧资源都有一份物体/材质常量的副本。数据变化时把脏计数设为环深度 N，
//! 之后每帧刷新当前帧资源中的副本并减一，N 帧之后所有副本都与最新值一致。

use bytemuck::Pod;

use crate::renderer::device::MappedBuffer;
use crate::renderer::resource::UploadBuffer;

/// 剩余需要刷新的帧资源数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyCounter(u32);

impl DirtyCounter {
    /// 已同步（所有帧资源都持有最新值）
    pub fn clean() -> Self {
        Self(0)
    }

    /// 需要刷新 `frames` 个帧资源
    pub fn dirty(frames: u32) -> Self {
        Self(frames)
    }

    pub fn frames_dirty(&self) -> u32 {
        self.0
    }

    pub fn is_dirty(&self) -> bool {
        self.0 > 0
    }
}

/// 可以写入常量缓冲区的实体（渲染项、材质）
pub trait ConstantSource {
    type Record: Pod;

    /// 常量缓冲区中的索引，实体生命周期内不变
    fn constant_index(&self) -> usize;

    fn dirty_counter(&self) -> DirtyCounter;

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter;

    /// 生成 GPU 布局的记录（矩阵已转置）
    fn build_record(&self) -> Self::Record;
}

/// 脏标记传播规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyPropagation {
    ring_depth: u32,
}

impl DirtyPropagation {
    pub fn new(ring_depth: usize) -> Self {
        assert!(ring_depth > 0, "Ring depth must be at least 1");
        Self {
            ring_depth: ring_depth as u32,
        }
    }

    pub fn ring_depth(&self) -> usize {
        self.ring_depth as usize
    }

    /// 新建实体的初始计数：每个帧资源都需要一份初始值
    pub fn initial(&self) -> DirtyCounter {
        DirtyCounter::dirty(self.ring_depth)
    }

    /// 数据已变化，所有帧资源都需要刷新
    pub fn mark_dirty<E: ConstantSource>(&self, entity: &mut E) {
        *entity.dirty_counter_mut() = DirtyCounter::dirty(self.ring_depth);
    }

    /// 若仍有帧资源持有旧值，则写入当前帧资源的缓冲区并减一
    ///
    /// 返回是否发生了写入。计数为 0 时不写入。
    pub fn refresh_if_dirty<E, B>(
        &self,
        entity: &mut E,
        buffer: &mut UploadBuffer<E::Record, B>,
    ) -> bool
    where
        E: ConstantSource,
        B: MappedBuffer,
    {
        let counter = entity.dirty_counter();
        if !counter.is_dirty() {
            return false;
        }

        let record = entity.build_record();
        buffer.copy_data(entity.constant_index(), &record);
        *entity.dirty_counter_mut() = DirtyCounter(counter.0 - 1);
        true
    }

    /// 对一组实体调用 [`refresh_if_dirty`](Self::refresh_if_dirty)，返回写入次数
    pub fn refresh_all<'a, E, B, I>(
        &self,
        entities: I,
        buffer: &mut UploadBuffer<E::Record, B>,
    ) -> usize
    where
        E: ConstantSource + 'a,
        B: MappedBuffer,
        I: IntoIterator<Item = &'a mut E>,
    {
        entities
            .into_iter()
            .map(|entity| self.refresh_if_dirty(entity, buffer))
            .filter(|&written| written)
            .count()
    }
}
